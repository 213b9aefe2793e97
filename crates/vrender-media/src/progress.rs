//! FFmpeg progress parsing.
//!
//! FFmpeg's stats line reports the output position as `time=HH:MM:SS.ms`.
//! A chunk may hold several stats lines (they are `\r`-separated), so the
//! last match wins.

use std::sync::LazyLock;

use regex::Regex;

static TIME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"time=(\d+):(\d{2}):(\d{2}(?:\.\d+)?)").expect("valid time pattern")
});

/// Most recent output position in a chunk, in seconds.
pub fn parse_time_seconds(chunk: &str) -> Option<f64> {
    let caps = TIME_PATTERN.captures_iter(chunk).last()?;
    let hours: f64 = caps[1].parse().ok()?;
    let minutes: f64 = caps[2].parse().ok()?;
    let seconds: f64 = caps[3].parse().ok()?;
    Some(hours * 3600.0 + minutes * 60.0 + seconds)
}

/// Percentage of `expected_secs` reached at `current_secs`.
///
/// `None` when the expected duration is unknown or not positive.
pub fn progress_percent(current_secs: f64, expected_secs: Option<f64>) -> Option<u8> {
    let expected = expected_secs.filter(|d| d.is_finite() && *d > 0.0)?;
    let pct = (current_secs / expected * 100.0).round().clamp(0.0, 100.0);
    Some(pct as u8)
}

/// Percentage reached according to a diagnostic chunk, if it can be computed.
pub fn chunk_progress(chunk: &str, expected_secs: Option<f64>) -> Option<u8> {
    parse_time_seconds(chunk).and_then(|current| progress_percent(current, expected_secs))
}
