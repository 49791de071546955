pub mod component;
pub mod init;
pub mod signal;
pub mod tools;
