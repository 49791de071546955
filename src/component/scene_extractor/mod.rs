//! 場景定格擷取元件
//!
//! 偵測場景邊界、計算各場景中點、以外部工具擷取
//! 每個場景一張代表定格畫面

mod frame_extractor;
mod main;
mod scene_detector;
mod timecode;

pub use frame_extractor::{
    ExtractionObserver, ExtractionOutcome, ExtractionReport, FrameExtractor, NullObserver,
};
pub use main::{RunConfig, RunSummary, SceneExtractor, compute_midframe_timecodes};
pub use scene_detector::{Algorithm, DetectorConfig, SceneBoundary, detect_scenes};
pub use timecode::{format_timecode, midpoint, quantize_to_frame};
