use crate::tools::ensure_directory_exists;
use anyhow::{Context, Result};
use log::{debug, warn};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// 單張擷取結果
#[derive(Debug)]
pub struct ExtractionOutcome {
    /// 1 起算的場景序號
    pub index: usize,
    pub timecode: String,
    pub output_path: PathBuf,
    /// None 表示成功
    pub error_message: Option<String>,
}

impl ExtractionOutcome {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.error_message.is_none()
    }
}

/// 批次擷取結果
#[derive(Debug, Default)]
pub struct ExtractionReport {
    pub outcomes: Vec<ExtractionOutcome>,
    pub success_count: usize,
    pub failed_count: usize,
}

/// 擷取進度觀察者
///
/// 每張圖擷取前後各通知一次，供前端驅動進度顯示。
/// 核心管線不直接碰任何呈現層狀態。
pub trait ExtractionObserver {
    fn on_extract_start(&mut self, _index: usize, _total: usize, _timecode: &str) {}
    fn on_extract_done(&mut self, _index: usize, _total: usize, _outcome: &ExtractionOutcome) {}
}

/// 不需要進度回報時使用
pub struct NullObserver;

impl ExtractionObserver for NullObserver {}

/// 逐張呼叫外部工具擷取定格畫面
///
/// 擷取工具是可替換的外部邊界：任何支援
/// 「seek 到時間碼、輸出單幀」語義的工具都能代入。
pub struct FrameExtractor {
    capture_bin: String,
    image_ext: String,
}

impl FrameExtractor {
    #[must_use]
    pub fn new(image_ext: &str) -> Self {
        Self {
            capture_bin: "ffmpeg".to_string(),
            image_ext: image_ext.to_string(),
        }
    }

    /// 替換擷取工具執行檔（測試或代用工具）
    #[must_use]
    pub fn with_command(mut self, capture_bin: &str) -> Self {
        self.capture_bin = capture_bin.to_string();
        self
    }

    /// 輸出檔名：1 起算、補零到 4 位（`0001.jpg`、`0002.jpg`…）
    ///
    /// 檔名順序即場景順序，下游依此排序，屬對外契約。
    #[must_use]
    pub fn output_path(&self, output_dir: &Path, index: usize) -> PathBuf {
        output_dir.join(format!("{index:04}.{}", self.image_ext))
    }

    /// 批次擷取
    ///
    /// 輸出資料夾建立失敗是致命錯誤，任何擷取開始前即中止。
    /// 單張失敗（工具跑了但沒產出）記錄後繼續；
    /// 工具本身無法啟動則立即中止整批——後續每張都注定失敗。
    /// 已寫出的圖檔在中止時一律保留。
    pub fn extract_frames(
        &self,
        video_path: &Path,
        timecodes: &[String],
        output_dir: &Path,
        shutdown_signal: &Arc<AtomicBool>,
        observer: &mut dyn ExtractionObserver,
    ) -> Result<ExtractionReport> {
        ensure_directory_exists(output_dir)
            .with_context(|| format!("無法建立輸出資料夾: {}", output_dir.display()))?;

        let total = timecodes.len();
        let mut report = ExtractionReport::default();

        for (i, timecode) in timecodes.iter().enumerate() {
            if shutdown_signal.load(Ordering::SeqCst) {
                warn!("收到中斷信號，停止擷取");
                break;
            }

            let index = i + 1;
            let out_path = self.output_path(output_dir, index);

            observer.on_extract_start(index, total, timecode);

            let outcome = match self.capture_frame(video_path, timecode, &out_path) {
                Ok(()) => ExtractionOutcome {
                    index,
                    timecode: timecode.clone(),
                    output_path: out_path,
                    error_message: None,
                },
                Err(CaptureError::Launch(e)) => {
                    // 環境錯誤：工具不存在或無法啟動，中止整批
                    return Err(e).with_context(|| {
                        format!("無法啟動擷取工具 '{}'，中止剩餘擷取", self.capture_bin)
                    });
                }
                Err(CaptureError::Item(msg)) => {
                    warn!("擷取失敗 [{index}/{total}] {timecode}: {msg}");
                    ExtractionOutcome {
                        index,
                        timecode: timecode.clone(),
                        output_path: out_path,
                        error_message: Some(msg),
                    }
                }
            };

            if outcome.is_success() {
                report.success_count += 1;
            } else {
                report.failed_count += 1;
            }

            observer.on_extract_done(index, total, &outcome);
            report.outcomes.push(outcome);
        }

        Ok(report)
    }

    fn capture_frame(
        &self,
        video_path: &Path,
        timecode: &str,
        out_path: &Path,
    ) -> std::result::Result<(), CaptureError> {
        debug!("擷取 {} -> {}", timecode, out_path.display());

        let output = Command::new(&self.capture_bin)
            .args(["-hide_banner", "-loglevel", "error", "-y", "-ss", timecode, "-i"])
            .arg(video_path)
            .args(["-frames:v", "1", "-q:v", "2"])
            .arg(out_path)
            .output()
            .map_err(CaptureError::Launch)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CaptureError::Item(format!(
                "擷取工具以非零狀態結束: {}",
                stderr.trim()
            )));
        }

        if !out_path.exists() {
            return Err(CaptureError::Item(format!(
                "圖檔未建立: {}",
                out_path.display()
            )));
        }

        Ok(())
    }
}

/// 區分可恢復的單張失敗與致命的啟動失敗
enum CaptureError {
    /// 工具無法啟動（不存在、無權限），整批中止
    Launch(std::io::Error),
    /// 工具跑了但該時間點失敗，記錄後繼續
    Item(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_path_naming() {
        let extractor = FrameExtractor::new("jpg");
        let dir = Path::new("/out");

        assert_eq!(extractor.output_path(dir, 1), PathBuf::from("/out/0001.jpg"));
        assert_eq!(extractor.output_path(dir, 42), PathBuf::from("/out/0042.jpg"));
        assert_eq!(
            extractor.output_path(dir, 10000),
            PathBuf::from("/out/10000.jpg")
        );
    }

    #[test]
    fn test_output_path_custom_ext() {
        let extractor = FrameExtractor::new("png");
        assert_eq!(
            extractor.output_path(Path::new("/out"), 3),
            PathBuf::from("/out/0003.png")
        );
    }

    #[test]
    fn test_outcome_success_flag() {
        let ok = ExtractionOutcome {
            index: 1,
            timecode: "00:00:01.000".to_string(),
            output_path: PathBuf::from("/out/0001.jpg"),
            error_message: None,
        };
        assert!(ok.is_success());

        let failed = ExtractionOutcome {
            error_message: Some("decode error".to_string()),
            ..ok
        };
        assert!(!failed.is_success());
    }
}
