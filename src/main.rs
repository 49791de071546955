use anyhow::Result;
use clap::Parser;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use mv_scene_extract::component::scene_extractor::{
    Algorithm, DetectorConfig, ExtractionObserver, ExtractionOutcome, RunConfig, SceneExtractor,
};
use mv_scene_extract::init;
use mv_scene_extract::signal::setup_shutdown_signal;
use std::path::PathBuf;

/// 偵測影片場景邊界，擷取每個場景中點的定格畫面
#[derive(Parser, Debug)]
#[command(name = "mv_scene_extract", version)]
struct Args {
    /// 輸入影片路徑
    video_path: PathBuf,

    /// 切點判定閾值（依演算法的原生刻度解讀）
    #[arg(short = 't', long, default_value_t = 3.0)]
    threshold: f64,

    /// 最短場景長度（幀）
    #[arg(long, default_value_t = 15)]
    min_scene_len: u32,

    /// adaptive 專用：鄰近幀視窗大小
    #[arg(long, default_value_t = 2)]
    window_size: u32,

    /// adaptive 專用：內容變化下限
    #[arg(long, default_value_t = 15.0)]
    min_content_val: f64,

    /// 偵測演算法（adaptive、content、threshold、hist）
    #[arg(short = 'a', long, default_value = "adaptive")]
    algorithm: String,

    /// 輸出資料夾
    #[arg(short = 'o', long, default_value = "midframes")]
    output: PathBuf,

    /// 輸出圖檔副檔名
    #[arg(long, default_value = "jpg")]
    image_ext: String,
}

/// 以進度條呈現擷取進度
///
/// 總數要到偵測完成才知道，進度條在第一次通知時才建立。
#[derive(Default)]
struct ProgressObserver {
    bar: Option<ProgressBar>,
}

impl ProgressObserver {
    fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}

impl ExtractionObserver for ProgressObserver {
    fn on_extract_start(&mut self, _index: usize, total: usize, timecode: &str) {
        let bar = self.bar.get_or_insert_with(|| {
            let bar = ProgressBar::new(total as u64);
            bar.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                    .expect("Invalid progress bar template")
                    .progress_chars("#>-"),
            );
            bar
        });
        bar.set_message(format!("擷取 {timecode}"));
    }

    fn on_extract_done(&mut self, index: usize, _total: usize, outcome: &ExtractionOutcome) {
        if let Some(bar) = &self.bar {
            if let Some(msg) = &outcome.error_message {
                bar.println(format!(
                    "  {} [{index:04}] {}",
                    style("✗").red(),
                    msg
                ));
            }
            bar.inc(1);
        }
    }
}

fn main() -> Result<()> {
    init::init();
    let args = Args::parse();
    let shutdown_signal = setup_shutdown_signal();

    // 設定錯誤在任何 I/O 前攔下
    let algorithm: Algorithm = args.algorithm.parse()?;

    let config = RunConfig {
        video_path: args.video_path,
        output_dir: args.output,
        image_ext: args.image_ext,
        detector: DetectorConfig {
            algorithm,
            threshold: args.threshold,
            min_scene_len: args.min_scene_len,
            window_size: args.window_size,
            min_content_val: args.min_content_val,
        },
    };

    println!("{}", style("=== 場景定格擷取 ===").cyan().bold());
    println!(
        "  {} {}",
        style("影片:").dim(),
        config.video_path.display()
    );
    println!(
        "  {} {} (threshold={})",
        style("演算法:").dim(),
        algorithm.as_str(),
        config.detector.threshold
    );

    let extractor = SceneExtractor::new(config, shutdown_signal);
    let mut observer = ProgressObserver::default();

    let summary = extractor.run(&mut observer)?;
    observer.finish();

    if summary.images_failed > 0 {
        println!(
            "{}",
            style(format!("{} 張擷取失敗，其餘已寫出", summary.images_failed)).yellow()
        );
    }

    println!("Detected {} scenes.", summary.scenes_detected);
    println!(
        "Extracted {} images to {}/",
        summary.images_extracted,
        summary.output_dir.display()
    );

    info!(
        "執行完成 - 場景: {}, 成功: {}, 失敗: {}",
        summary.scenes_detected, summary.images_extracted, summary.images_failed
    );

    Ok(())
}
