use super::frame_extractor::{ExtractionObserver, FrameExtractor};
use super::scene_detector::{DetectorConfig, SceneBoundary, detect_scenes};
use super::timecode::{format_timecode, midpoint, quantize_to_frame};
use crate::tools::{
    RunSettings, ensure_directory_exists, get_video_info, validate_file_exists, write_run_settings,
};
use anyhow::{Context, Result};
use log::{debug, info};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

/// 一次執行的完整設定
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub video_path: PathBuf,
    pub output_dir: PathBuf,
    pub image_ext: String,
    pub detector: DetectorConfig,
}

/// 執行結果摘要
///
/// 單張擷取失敗不影響整體完成；摘要區分偵測到的
/// 場景數與實際寫出的圖檔數。
#[derive(Debug)]
pub struct RunSummary {
    pub scenes_detected: usize,
    pub images_extracted: usize,
    pub images_failed: usize,
    pub output_dir: PathBuf,
}

/// 場景定格擷取管線
///
/// 四階段線性流程：
/// A. 讀取影片資訊（ffprobe）
/// B. 場景邊界偵測
/// C. 計算各場景中點時間碼
/// D. 逐張擷取定格畫面
pub struct SceneExtractor {
    config: RunConfig,
    shutdown_signal: Arc<AtomicBool>,
}

impl SceneExtractor {
    #[must_use]
    pub const fn new(config: RunConfig, shutdown_signal: Arc<AtomicBool>) -> Self {
        Self {
            config,
            shutdown_signal,
        }
    }

    /// 執行管線
    ///
    /// 設定錯誤、來源無法開啟、輸出資料夾無法建立、
    /// 擷取工具無法啟動皆為致命錯誤直接返回；
    /// 零場景與部分擷取失敗都是正常結束。
    pub fn run(&self, observer: &mut dyn ExtractionObserver) -> Result<RunSummary> {
        // 任何 I/O 前先驗證設定與輸入
        self.config.detector.validate()?;
        validate_file_exists(&self.config.video_path)?;

        ensure_directory_exists(&self.config.output_dir)
            .with_context(|| format!("無法建立輸出資料夾: {}", self.config.output_dir.display()))?;

        write_run_settings(&RunSettings {
            video_path: &self.config.video_path,
            output_dir: &self.config.output_dir,
            algorithm: self.config.detector.algorithm.as_str(),
            threshold: self.config.detector.threshold,
            min_scene_len: self.config.detector.min_scene_len,
            window_size: self.config.detector.window_size,
            min_content_val: self.config.detector.min_content_val,
        })?;

        // Stage A: 影片資訊
        let video_info = get_video_info(&self.config.video_path)
            .with_context(|| format!("無法讀取影片資訊: {}", self.config.video_path.display()))?;
        info!(
            "影片資訊: {:.1}s, {:.2}fps",
            video_info.duration_seconds, video_info.frame_rate
        );

        // Stage B: 場景偵測
        let boundaries = detect_scenes(&self.config.video_path, &video_info, &self.config.detector)
            .with_context(|| "場景偵測失敗")?;
        info!("偵測到 {} 個場景", boundaries.len());

        if boundaries.is_empty() {
            return Ok(RunSummary {
                scenes_detected: 0,
                images_extracted: 0,
                images_failed: 0,
                output_dir: self.config.output_dir.clone(),
            });
        }

        // Stage C: 中點時間碼（以開檔時取得的 fps 對齊幀邊界）
        let timecodes = compute_midframe_timecodes(&boundaries, video_info.frame_rate);
        debug!("中點時間碼: {timecodes:?}");

        // Stage D: 擷取
        let extractor = FrameExtractor::new(&self.config.image_ext);
        let report = extractor.extract_frames(
            &self.config.video_path,
            &timecodes,
            &self.config.output_dir,
            &self.shutdown_signal,
            observer,
        )?;

        info!(
            "擷取完成: 成功 {}, 失敗 {}",
            report.success_count, report.failed_count
        );

        Ok(RunSummary {
            scenes_detected: boundaries.len(),
            images_extracted: report.success_count,
            images_failed: report.failed_count,
            output_dir: self.config.output_dir.clone(),
        })
    }
}

/// 計算每個場景的中點時間碼，順序與場景序列一致
///
/// 中點先對齊幀邊界再格式化，與擷取工具以幀為單位的
/// seek 語義一致（參考實作的 CLI/GUI 在此不一致，統一採幀對齊）。
#[must_use]
pub fn compute_midframe_timecodes(boundaries: &[SceneBoundary], fps: f64) -> Vec<String> {
    boundaries
        .iter()
        .map(|b| format_timecode(quantize_to_frame(midpoint(b.start, b.end), fps)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_midframe_timecodes() {
        let boundaries = vec![
            SceneBoundary {
                start: 10.0,
                end: 20.0,
            },
            SceneBoundary {
                start: 20.0,
                end: 151.0,
            },
        ];

        let timecodes = compute_midframe_timecodes(&boundaries, 30.0);

        assert_eq!(timecodes.len(), 2);
        assert_eq!(timecodes[0], "00:00:15.000");
        // (20 + 151) / 2 = 85.5，落在整數幀上
        assert_eq!(timecodes[1], "00:01:25.500");
    }

    #[test]
    fn test_compute_midframe_timecodes_quantizes() {
        let boundaries = vec![SceneBoundary {
            start: 0.0,
            end: 1.01,
        }];

        // 中點 0.505s 在 30fps 下對齊到第 15 幀 = 0.5s
        let timecodes = compute_midframe_timecodes(&boundaries, 30.0);
        assert_eq!(timecodes[0], "00:00:00.500");
    }

    #[test]
    fn test_compute_midframe_timecodes_empty() {
        assert!(compute_midframe_timecodes(&[], 30.0).is_empty());
    }
}
