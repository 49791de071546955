use anyhow::{Result, bail};
use std::path::Path;

pub fn validate_file_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        bail!("檔案不存在: {}", path.display());
    }
    if !path.is_file() {
        bail!("路徑不是檔案: {}", path.display());
    }
    Ok(())
}

/// 建立資料夾（含中間層）；路徑已被檔案佔用時直接失敗
pub fn ensure_directory_exists(path: &Path) -> Result<()> {
    if path.exists() {
        if !path.is_dir() {
            bail!("路徑已存在且不是資料夾: {}", path.display());
        }
        return Ok(());
    }
    std::fs::create_dir_all(path)?;
    Ok(())
}
