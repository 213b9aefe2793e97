//! Export presets and encoding constants.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default video codec (H.264)
pub const DEFAULT_VIDEO_CODEC: &str = "libx264";
/// Audio codec for every render
pub const DEFAULT_AUDIO_CODEC: &str = "aac";
/// Pixel format for broad player compatibility
pub const DEFAULT_PIX_FMT: &str = "yuv420p";
/// x264 preset when no export preset is selected
pub const DEFAULT_X264_PRESET: &str = "veryfast";
/// x264 preset for lossless exports
pub const LOSSLESS_X264_PRESET: &str = "veryslow";
/// CRF for lossless exports
pub const LOSSLESS_CRF: u8 = 0;
/// Moves the moov atom up front for progressive playback
pub const FASTSTART_MOVFLAGS: &str = "+faststart";
/// Canvas fill color used when padding
pub const PAD_COLOR: &str = "black";

/// Target canvas and bitrate for an export preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresetSpec {
    /// Canvas width, `None` keeps the source size
    pub width: Option<u32>,
    /// Canvas height, `None` keeps the source size
    pub height: Option<u32>,
    /// Target video bitrate (e.g. "8000k")
    pub video_bitrate: Option<&'static str>,
}

impl PresetSpec {
    /// Fixed output canvas, if the preset resizes.
    pub fn canvas(&self) -> Option<(u32, u32)> {
        self.width.zip(self.height)
    }
}

/// Export preset selecting resolution, aspect and bitrate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExportPreset {
    /// 1080x1920 vertical
    #[serde(rename = "tiktok_9_16")]
    Tiktok916,
    /// 1080x1080 square
    #[serde(rename = "instagram_square")]
    InstagramSquare,
    /// 1920x1080 landscape at 8 Mbps
    #[serde(rename = "youtube")]
    Youtube,
    /// CRF 0, source size
    #[serde(rename = "lossless")]
    Lossless,
}

impl ExportPreset {
    pub const ALL: [ExportPreset; 4] = [
        ExportPreset::Tiktok916,
        ExportPreset::InstagramSquare,
        ExportPreset::Youtube,
        ExportPreset::Lossless,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExportPreset::Tiktok916 => "tiktok_9_16",
            ExportPreset::InstagramSquare => "instagram_square",
            ExportPreset::Youtube => "youtube",
            ExportPreset::Lossless => "lossless",
        }
    }

    /// Static preset table.
    pub fn spec(&self) -> PresetSpec {
        match self {
            ExportPreset::Tiktok916 => PresetSpec {
                width: Some(1080),
                height: Some(1920),
                video_bitrate: Some("5000k"),
            },
            ExportPreset::InstagramSquare => PresetSpec {
                width: Some(1080),
                height: Some(1080),
                video_bitrate: Some("5000k"),
            },
            ExportPreset::Youtube => PresetSpec {
                width: Some(1920),
                height: Some(1080),
                video_bitrate: Some("8000k"),
            },
            ExportPreset::Lossless => PresetSpec {
                width: None,
                height: None,
                video_bitrate: None,
            },
        }
    }

    /// Parse a client-supplied preset name.
    ///
    /// Unknown or blank names fall back to the default encode.
    pub fn from_name(name: Option<&str>) -> Option<Self> {
        name.map(str::trim)
            .filter(|n| !n.is_empty())
            .and_then(|n| n.parse().ok())
    }
}

impl fmt::Display for ExportPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown export preset name.
#[derive(Debug, Clone, Error)]
#[error("unknown export preset: {0}")]
pub struct ParsePresetError(pub String);

impl FromStr for ExportPreset {
    type Err = ParsePresetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ExportPreset::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| ParsePresetError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_canvas_table() {
        assert_eq!(ExportPreset::Tiktok916.spec().canvas(), Some((1080, 1920)));
        assert_eq!(ExportPreset::InstagramSquare.spec().canvas(), Some((1080, 1080)));
        assert_eq!(ExportPreset::Youtube.spec().canvas(), Some((1920, 1080)));
        assert_eq!(ExportPreset::Lossless.spec().canvas(), None);
        assert_eq!(ExportPreset::Youtube.spec().video_bitrate, Some("8000k"));
    }

    #[test]
    fn test_preset_names_round_trip_through_serde() {
        for preset in ExportPreset::ALL {
            let json = serde_json::to_string(&preset).unwrap();
            assert_eq!(json, format!("\"{}\"", preset.as_str()));
        }
    }

    #[test]
    fn test_from_name() {
        assert_eq!(ExportPreset::from_name(Some("youtube")), Some(ExportPreset::Youtube));
        assert_eq!(ExportPreset::from_name(Some("tiktok_9_16")), Some(ExportPreset::Tiktok916));
        assert_eq!(ExportPreset::from_name(Some("vhs")), None);
        assert_eq!(ExportPreset::from_name(Some("  ")), None);
        assert_eq!(ExportPreset::from_name(None), None);
    }
}
