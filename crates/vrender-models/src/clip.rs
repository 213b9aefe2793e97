//! Clip specification model.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// One source clip of a render.
///
/// `url` must be reachable by the machine running FFmpeg: a server-local
/// path or an HTTP URL FFmpeg can open directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ClipSpec {
    /// Source location
    #[validate(length(min = 1, message = "clip url required"))]
    pub url: String,
    /// Trim start in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<f64>,
    /// Trim end in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<f64>,
}

impl ClipSpec {
    /// Create an untrimmed clip.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            start_time: None,
            end_time: None,
        }
    }

    /// Returns a clip trimmed to `[start, end]`.
    pub fn with_range(mut self, start: f64, end: f64) -> Self {
        self.start_time = Some(start);
        self.end_time = Some(end);
        self
    }

    /// Trim range, present only when `end > start` and `end > 0`.
    ///
    /// A clip without a usable range consumes the whole source.
    pub fn trim_range(&self) -> Option<(f64, f64)> {
        let start = self.start_time.unwrap_or(0.0);
        let end = self.end_time.unwrap_or(0.0);
        (end > 0.0 && end > start).then_some((start, end))
    }
}
