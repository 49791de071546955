/// 計算場景中點時間（秒）
#[must_use]
pub fn midpoint(start: f64, end: f64) -> f64 {
    f64::midpoint(start, end)
}

/// 將秒數轉為 `HH:MM:SS.mmm` 時間碼字串
///
/// 先四捨五入到毫秒再做整數除法，
/// 避免 59.9996 之類的值被格式化成 "60.000"。
/// 小時不設上限（不做 24 小時回繞），負值視為 0。
#[must_use]
pub fn format_timecode(seconds: f64) -> String {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;

    let hours = total_ms / 3_600_000;
    let minutes = (total_ms / 60_000) % 60;
    let secs = (total_ms / 1000) % 60;
    let millis = total_ms % 1000;

    format!("{hours:02}:{minutes:02}:{secs:02}.{millis:03}")
}

/// 將秒數對齊到最接近的幀邊界（向下取整）
///
/// 下游擷取工具以幀為單位 seek，先對齊可避免
/// 擷取到中點前後不一致的幀。fps 不明時原樣返回。
#[must_use]
pub fn quantize_to_frame(seconds: f64, fps: f64) -> f64 {
    if fps > 0.0 {
        (seconds * fps).floor() / fps
    } else {
        seconds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_midpoint() {
        assert!((midpoint(10.0, 20.0) - 15.0).abs() < f64::EPSILON);
        assert!((midpoint(0.0, 1.0) - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_midpoint_within_bounds() {
        let cases = [(0.0, 0.1), (3.5, 7.25), (100.0, 3600.0)];
        for (start, end) in cases {
            let mid = midpoint(start, end);
            assert!(mid >= start && mid <= end);
        }
    }

    #[test]
    fn test_format_timecode_basic() {
        assert_eq!(format_timecode(75.5), "00:01:15.500");
        assert_eq!(format_timecode(3661.25), "01:01:01.250");
        assert_eq!(format_timecode(0.0), "00:00:00.000");
    }

    #[test]
    fn test_format_timecode_millis_rollover() {
        // 59.9996 四捨五入到毫秒後應進位到下一分鐘
        assert_eq!(format_timecode(59.9996), "00:01:00.000");
        assert_eq!(format_timecode(59.999), "00:00:59.999");
    }

    #[test]
    fn test_format_timecode_multi_hour() {
        // 超過 24 小時不回繞
        assert_eq!(format_timecode(90_000.5), "25:00:00.500");
    }

    #[test]
    fn test_format_timecode_negative_clamps() {
        assert_eq!(format_timecode(-1.5), "00:00:00.000");
    }

    #[test]
    fn test_quantize_to_frame() {
        // 30fps 下 10.37s 落在第 311 幀
        let q = quantize_to_frame(10.37, 30.0);
        assert!((q - 311.0 / 30.0).abs() < 1e-9);

        // 已對齊的值不變
        assert!((quantize_to_frame(15.0, 30.0) - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_quantize_to_frame_unknown_fps() {
        assert!((quantize_to_frame(10.37, 0.0) - 10.37).abs() < f64::EPSILON);
    }
}
