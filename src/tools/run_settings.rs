use anyhow::{Context, Result};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

/// 一次執行採用的參數，寫入輸出資料夾留檔
#[derive(Debug)]
pub struct RunSettings<'a> {
    pub video_path: &'a Path,
    pub output_dir: &'a Path,
    pub algorithm: &'a str,
    pub threshold: f64,
    pub min_scene_len: u32,
    pub window_size: u32,
    pub min_content_val: f64,
}

/// 在輸出資料夾寫入 settings.txt
///
/// 純文字、一行一個欄位，給人看的紀錄，不做機器回讀。
pub fn write_run_settings(settings: &RunSettings) -> Result<PathBuf> {
    let path = settings.output_dir.join("settings.txt");
    let content = render_settings(settings);

    fs::write(&path, content)
        .with_context(|| format!("無法寫入執行設定: {}", path.display()))?;

    Ok(path)
}

fn render_settings(settings: &RunSettings) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "video_path: {}", settings.video_path.display());
    let _ = writeln!(out, "output_dir: {}", settings.output_dir.display());
    let _ = writeln!(out, "algorithm: {}", settings.algorithm);
    let _ = writeln!(out, "threshold: {}", settings.threshold);
    let _ = writeln!(out, "min_scene_len: {}", settings.min_scene_len);
    let _ = writeln!(out, "window_size: {}", settings.window_size);
    let _ = writeln!(out, "min_content_val: {}", settings.min_content_val);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_settings_one_line_per_field() {
        let settings = RunSettings {
            video_path: Path::new("/videos/mv.mp4"),
            output_dir: Path::new("/out/midframes"),
            algorithm: "adaptive",
            threshold: 3.0,
            min_scene_len: 15,
            window_size: 2,
            min_content_val: 15.0,
        };

        let content = render_settings(&settings);
        let lines: Vec<&str> = content.lines().collect();

        assert_eq!(lines.len(), 7);
        assert_eq!(lines[0], "video_path: /videos/mv.mp4");
        assert_eq!(lines[2], "algorithm: adaptive");
        assert_eq!(lines[3], "threshold: 3");
        assert_eq!(lines[4], "min_scene_len: 15");
    }
}
