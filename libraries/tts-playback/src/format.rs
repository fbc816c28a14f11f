//! Display helpers for the player projection

/// Format seconds as `m:ss`
///
/// Truncates rather than rounds, so 59.9 seconds renders as `0:59`.
/// Non-finite or negative input renders as `0:00`.
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "0:00".to_string();
    }

    let minutes = (seconds / 60.0).floor() as u64;
    let secs = (seconds % 60.0).floor() as u64;
    format!("{}:{:02}", minutes, secs)
}

/// Fraction of `position` within `duration`, clamped to 0.0-1.0
///
/// Unknown (non-finite) or zero durations yield 0.0.
pub fn progress_fraction(position: f64, duration: Option<f64>) -> f64 {
    match duration {
        Some(d) if d.is_finite() && d > 0.0 && position.is_finite() => {
            (position / d).clamp(0.0, 1.0)
        }
        _ => 0.0,
    }
}
