use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// 建立 Ctrl-C 中斷旗標
///
/// 擷取迴圈在每張圖之間檢查此旗標，作為合作式取消點；
/// 偵測掃描本身不可中途停止，會跑完或整個失敗。
#[must_use]
pub fn setup_shutdown_signal() -> Arc<AtomicBool> {
    let shutdown_signal = Arc::new(AtomicBool::new(false));
    let signal_clone = Arc::clone(&shutdown_signal);

    ctrlc::set_handler(move || {
        signal_clone.store(true, Ordering::SeqCst);
        eprintln!("\n收到中斷信號，完成目前項目後停止...");
    })
    .expect("無法設定 Ctrl-C 處理器");

    shutdown_signal
}
