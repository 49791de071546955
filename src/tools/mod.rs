mod ffprobe_info;
mod path_validator;
mod run_settings;

pub use ffprobe_info::{VideoInfo, get_video_info};
pub use path_validator::{ensure_directory_exists, validate_file_exists};
pub use run_settings::{RunSettings, write_run_settings};
