use crate::tools::VideoInfo;
use anyhow::{Context, Result, bail};
use log::debug;
use regex::Regex;
use std::path::Path;
use std::process::Command;
use std::str::FromStr;

/// 分析時縮放到的寬度（加速偵測）
const ANALYZE_WIDTH: u32 = 320;

/// 切點去重容差（秒）
const CUT_DEDUP_TOLERANCE: f64 = 0.1;

/// threshold（淡入淡出）模式的最短黑幀持續時間（秒）
const MIN_FADE_DURATION: f64 = 0.05;

/// 場景偵測演算法
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    Adaptive,
    Content,
    Threshold,
    Hist,
}

impl Algorithm {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Adaptive => "adaptive",
            Self::Content => "content",
            Self::Threshold => "threshold",
            Self::Hist => "hist",
        }
    }
}

impl FromStr for Algorithm {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "adaptive" => Ok(Self::Adaptive),
            "content" => Ok(Self::Content),
            "threshold" => Ok(Self::Threshold),
            "hist" => Ok(Self::Hist),
            other => bail!("未知的偵測演算法: {other}（可用: adaptive, content, threshold, hist）"),
        }
    }
}

/// 場景偵測設定
///
/// `window_size` 與 `min_content_val` 僅 adaptive 演算法使用，
/// 其他演算法會靜默忽略這兩個欄位（與參考實作行為一致）。
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    pub algorithm: Algorithm,
    /// 切點判定閾值，依各演算法的原生刻度解讀
    pub threshold: f64,
    /// 最短場景長度（幀）
    pub min_scene_len: u32,
    /// adaptive 專用：局部對比正規化的鄰近幀視窗
    pub window_size: u32,
    /// adaptive 專用：低於此值的幀間差異視為雜訊
    pub min_content_val: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::Adaptive,
            threshold: 3.0,
            min_scene_len: 15,
            window_size: 2,
            min_content_val: 15.0,
        }
    }
}

impl DetectorConfig {
    /// 驗證參數，任何 I/O 之前先失敗
    pub fn validate(&self) -> Result<()> {
        if !self.threshold.is_finite() || self.threshold < 0.0 {
            bail!("threshold 必須是非負數值: {}", self.threshold);
        }
        if self.min_scene_len == 0 {
            bail!("min_scene_len 必須至少為 1 幀");
        }
        if self.window_size == 0 {
            bail!("window_size 必須至少為 1");
        }
        if !self.min_content_val.is_finite() || self.min_content_val < 0.0 {
            bail!("min_content_val 必須是非負數值: {}", self.min_content_val);
        }
        Ok(())
    }
}

/// 場景邊界，不變量 `start < end`
#[derive(Debug, Clone, Copy)]
pub struct SceneBoundary {
    pub start: f64,
    pub end: f64,
}

/// 偵測場景邊界
///
/// 單次串流掃描：依演算法組出對應的 ffmpeg 濾鏡，
/// 解析濾鏡輸出的切點後組裝成連續不重疊、
/// 覆蓋 `[0, duration]` 的邊界序列。
/// 解碼資源由 ffmpeg 子程序持有，程序結束即釋放。
pub fn detect_scenes(
    path: &Path,
    video_info: &VideoInfo,
    config: &DetectorConfig,
) -> Result<Vec<SceneBoundary>> {
    config.validate()?;

    let duration = video_info.duration_seconds;

    debug!(
        "場景偵測設定: algorithm={}, threshold={}, min_scene_len={}",
        config.algorithm.as_str(),
        config.threshold,
        config.min_scene_len
    );

    let cuts = match config.algorithm {
        Algorithm::Content => {
            let filter = format!("scdet=s=1:t={}", config.threshold);
            let output = run_detection_filter(path, &filter)?;
            parse_scdet_times(&output.stderr)?
        }
        Algorithm::Adaptive => {
            // 以 t=0 讓 scdet 對每一幀附上分數，再用視窗正規化挑切點
            let filter = "scdet=s=1:t=0,metadata=mode=print:key=lavfi.scd.score:file=-";
            let output = run_detection_filter(path, filter)?;
            let scores = parse_score_stream(&output.stdout)?;
            select_adaptive_cuts(
                &scores,
                config.threshold,
                config.window_size as usize,
                config.min_content_val,
            )
        }
        Algorithm::Threshold => {
            let pix_th = (config.threshold / 255.0).clamp(0.0, 1.0);
            let filter = format!("blackdetect=d={MIN_FADE_DURATION}:pix_th={pix_th:.4}");
            let output = run_detection_filter(path, &filter)?;
            parse_blackdetect_cuts(&output.stderr)?
        }
        Algorithm::Hist => {
            let scene_th = (config.threshold / 100.0).clamp(0.0, 1.0);
            let filter = format!("select='gt(scene,{scene_th:.4})',metadata=mode=print:file=-");
            let output = run_detection_filter(path, &filter)?;
            parse_selected_times(&output.stdout)?
        }
    };

    let min_len_secs = f64::from(config.min_scene_len) / video_info.frame_rate.max(1.0);
    let boundaries = build_boundaries(cuts, duration, min_len_secs);

    debug!("偵測到 {} 個場景", boundaries.len());

    Ok(boundaries)
}

struct FilterOutput {
    stdout: String,
    stderr: String,
}

/// 執行一次偵測掃描，回收濾鏡輸出
fn run_detection_filter(path: &Path, filter: &str) -> Result<FilterOutput> {
    let full_filter = format!("scale={ANALYZE_WIDTH}:-1,{filter}");

    let output = Command::new("ffmpeg")
        .args(["-hide_banner", "-i"])
        .arg(path)
        .args([
            "-an", "-sn", "-dn", "-threads", "1", "-vf", &full_filter, "-f", "null", "-",
        ])
        .output()
        .with_context(|| format!("無法執行 ffmpeg 場景偵測: {}", path.display()))?;

    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

    if !output.status.success() {
        let tail: String = stderr.lines().rev().take(3).collect::<Vec<_>>().join(" / ");
        bail!("場景偵測失敗（無法開啟或解碼來源）: {tail}");
    }

    Ok(FilterOutput {
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr,
    })
}

/// 解析 scdet 的切點輸出
///
/// 格式依 ffmpeg 版本可能是
/// `[scdet @ 0x...] t:NN.NNN pts_time:NN.NNN` 或 `lavfi.scd.time=NN.NNN`
fn parse_scdet_times(output: &str) -> Result<Vec<f64>> {
    let time_regex = Regex::new(r"t:([0-9.]+)")?;
    let scd_time_regex = Regex::new(r"lavfi\.scd\.time=([0-9.]+)")?;

    let mut cuts = Vec::new();
    for line in output.lines() {
        let timestamp = time_regex
            .captures(line)
            .or_else(|| scd_time_regex.captures(line))
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<f64>().ok());

        if let Some(timestamp) = timestamp {
            cuts.push(timestamp);
        }
    }

    Ok(cuts)
}

/// 解析 metadata=mode=print 輸出的逐幀分數串流
///
/// 兩行一組：
/// `frame:42   pts:21504   pts_time:1.4`
/// `lavfi.scd.score=0.031`
fn parse_score_stream(output: &str) -> Result<Vec<(f64, f64)>> {
    let pts_regex = Regex::new(r"pts_time:([0-9.]+)")?;
    let score_regex = Regex::new(r"lavfi\.scd\.score=([0-9.]+)")?;

    let mut scores = Vec::new();
    let mut current_pts: Option<f64> = None;

    for line in output.lines() {
        if let Some(caps) = pts_regex.captures(line) {
            current_pts = caps.get(1).and_then(|m| m.as_str().parse().ok());
        } else if let Some(caps) = score_regex.captures(line)
            && let Some(pts) = current_pts
            && let Some(score) = caps.get(1).and_then(|m| m.as_str().parse::<f64>().ok())
        {
            scores.push((pts, score));
            current_pts = None;
        }
    }

    Ok(scores)
}

/// 以視窗正規化從分數串流挑出切點
///
/// 每幀分數除以鄰近 `window` 幀（不含自身）的平均，
/// 比值達到 threshold 且分數不低於 min_content_val 才算切點。
fn select_adaptive_cuts(
    scores: &[(f64, f64)],
    threshold: f64,
    window: usize,
    min_content_val: f64,
) -> Vec<f64> {
    let mut cuts = Vec::new();

    for (i, &(timestamp, score)) in scores.iter().enumerate() {
        if score < min_content_val {
            continue;
        }

        let lo = i.saturating_sub(window);
        let hi = (i + window).min(scores.len().saturating_sub(1));

        let mut sum = 0.0;
        let mut count = 0usize;
        for (j, &(_, neighbor)) in scores.iter().enumerate().take(hi + 1).skip(lo) {
            if j != i {
                sum += neighbor;
                count += 1;
            }
        }

        // 鄰近幀全為靜止畫面時，分數本身已超過雜訊下限即視為切點
        let is_cut = if count == 0 || sum <= f64::EPSILON {
            true
        } else {
            score / (sum / count as f64) >= threshold
        };

        if is_cut {
            cuts.push(timestamp);
        }
    }

    cuts
}

/// 解析 blackdetect 輸出，取每段黑幀區間的中點作為切點
fn parse_blackdetect_cuts(output: &str) -> Result<Vec<f64>> {
    let black_regex = Regex::new(r"black_start:([0-9.]+)\s+black_end:([0-9.]+)")?;

    let mut cuts = Vec::new();
    for caps in black_regex.captures_iter(output) {
        let start: Option<f64> = caps.get(1).and_then(|m| m.as_str().parse().ok());
        let end: Option<f64> = caps.get(2).and_then(|m| m.as_str().parse().ok());

        if let (Some(start), Some(end)) = (start, end)
            && end >= start
        {
            cuts.push(f64::midpoint(start, end));
        }
    }

    Ok(cuts)
}

/// 解析 select 濾鏡通過的幀時間（每個通過的幀即是一個切點）
fn parse_selected_times(output: &str) -> Result<Vec<f64>> {
    let pts_regex = Regex::new(r"pts_time:([0-9.]+)")?;

    let mut cuts = Vec::new();
    for line in output.lines() {
        if let Some(timestamp) = pts_regex
            .captures(line)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<f64>().ok())
        {
            cuts.push(timestamp);
        }
    }

    Ok(cuts)
}

/// 將切點組裝成覆蓋全片、連續不重疊的場景邊界
///
/// 與前一個邊界或片尾距離不足最短場景長度的切點會被捨棄；
/// 來源本身短於最短場景長度時回傳空序列（零場景屬正常結束）。
fn build_boundaries(mut cuts: Vec<f64>, duration: f64, min_len_secs: f64) -> Vec<SceneBoundary> {
    if duration <= 0.0 || duration < min_len_secs {
        return Vec::new();
    }

    cuts.sort_by(|a, b| a.partial_cmp(b).unwrap());
    cuts.dedup_by(|a, b| (*a - *b).abs() < CUT_DEDUP_TOLERANCE);

    let mut points = vec![0.0];
    let mut prev = 0.0;
    for cut in cuts {
        if cut <= 0.0 || cut >= duration {
            continue;
        }
        if cut - prev >= min_len_secs && duration - cut >= min_len_secs {
            points.push(cut);
            prev = cut;
        }
    }
    points.push(duration);

    points
        .windows(2)
        .filter(|w| w[1] - w[0] > f64::EPSILON)
        .map(|w| SceneBoundary {
            start: w[0],
            end: w[1],
        })
        .collect()
}
