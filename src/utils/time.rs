//! Playback clock formatting

/// Format a playback position as `m:ss` or `h:mm:ss`
///
/// Returns `--:--` for unknown (non-finite) or negative positions, e.g. the
/// duration of a live stream.
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "--:--".to_string();
    }
    let total = seconds.floor() as u64;
    let h = total / 3600;
    let m = (total % 3600) / 60;
    let s = total % 60;
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m}:{s:02}")
    }
}
