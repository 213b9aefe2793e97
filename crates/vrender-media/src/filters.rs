//! Typed FFmpeg filter graph.
//!
//! Filters are built as values and serialized in one place. All escaping of
//! the filter-graph syntax goes through [`escape_filter_value`], so call sites
//! never concatenate raw user text into a graph.

use std::fmt;
use std::path::Path;

use vrender_models::encoding::PAD_COLOR;

/// Escape a value embedded in a filter option.
///
/// The graph syntax uses `:` to separate options and `'` to quote, so both
/// are backslash-escaped (backslashes first).
pub fn escape_filter_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 8);
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            ':' => out.push_str("\\:"),
            '\'' => out.push_str("\\'"),
            _ => out.push(ch),
        }
    }
    out
}

/// Escape a filesystem path for use inside a filter option.
///
/// Windows separators are normalized to `/` before escaping.
pub fn escape_filter_path(path: &Path) -> String {
    let normalized = path.to_string_lossy().replace('\\', "/");
    escape_filter_value(&normalized)
}

/// Quarter-turn transpose directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transpose {
    Clockwise,
    CounterClockwise,
}

impl Transpose {
    fn code(&self) -> u8 {
        match self {
            Transpose::Clockwise => 1,
            Transpose::CounterClockwise => 2,
        }
    }
}

/// Single filter node.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Join `segments` inputs of `video` + `audio` streams each
    Concat {
        segments: usize,
        video: u32,
        audio: u32,
    },
    /// Scale down to fit inside the box, keeping aspect ratio
    ScaleToFit { width: u32, height: u32 },
    /// Center on a fixed canvas
    Pad { width: u32, height: u32 },
    /// Burn in a subtitle file
    Subtitles { path: String },
    /// Brightness (-1..1) and contrast (>= 0)
    Eq { brightness: f64, contrast: f64 },
    Transpose(Transpose),
    HFlip,
    VFlip,
    /// Arbitrary rotation in radians
    Rotate { radians: f64 },
    /// Centered white text near the top
    DrawText { text: String, font_size: u32 },
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Concat {
                segments,
                video,
                audio,
            } => write!(f, "concat=n={}:v={}:a={}", segments, video, audio),
            Filter::ScaleToFit { width, height } => write!(
                f,
                "scale=w={}:h={}:force_original_aspect_ratio=decrease",
                width, height
            ),
            Filter::Pad { width, height } => write!(
                f,
                "pad={w}:{h}:({w}-iw)/2:({h}-ih)/2:{color}",
                w = width,
                h = height,
                color = PAD_COLOR
            ),
            Filter::Subtitles { path } => write!(f, "subtitles='{}'", path),
            Filter::Eq {
                brightness,
                contrast,
            } => write!(f, "eq=brightness={}:contrast={}", brightness, contrast),
            Filter::Transpose(dir) => write!(f, "transpose={}", dir.code()),
            Filter::HFlip => f.write_str("hflip"),
            Filter::VFlip => f.write_str("vflip"),
            Filter::Rotate { radians } => write!(f, "rotate={}", radians),
            Filter::DrawText { text, font_size } => write!(
                f,
                "drawtext=text='{}':fontcolor=white:fontsize={}:x=(w-tw)/2:y=50",
                escape_filter_value(text),
                font_size
            ),
        }
    }
}

impl Filter {
    /// Subtitles filter for a file on disk.
    pub fn subtitles(path: &Path) -> Self {
        Filter::Subtitles {
            path: escape_filter_path(path),
        }
    }

    /// Scale-to-fit followed by a centered pad, yielding exactly `width`x`height`.
    pub fn fit_canvas(width: u32, height: u32) -> [Filter; 2] {
        [
            Filter::ScaleToFit { width, height },
            Filter::Pad { width, height },
        ]
    }
}

/// A labeled chain of filters: `[in]f1,f2[out]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterChain {
    inputs: Vec<String>,
    filters: Vec<Filter>,
    outputs: Vec<String>,
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an input pad label (without brackets).
    pub fn input(mut self, label: impl Into<String>) -> Self {
        self.inputs.push(label.into());
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn filters<I>(mut self, filters: I) -> Self
    where
        I: IntoIterator<Item = Filter>,
    {
        self.filters.extend(filters);
        self
    }

    /// Add an output pad label (without brackets).
    pub fn output(mut self, label: impl Into<String>) -> Self {
        self.outputs.push(label.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

impl fmt::Display for FilterChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for label in &self.inputs {
            write!(f, "[{}]", label)?;
        }
        for (i, filter) in self.filters.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", filter)?;
        }
        for label in &self.outputs {
            write!(f, "[{}]", label)?;
        }
        Ok(())
    }
}

/// A complete `-filter_complex` graph.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterGraph {
    chains: Vec<FilterChain>,
}

impl FilterGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn chain(mut self, chain: FilterChain) -> Self {
        self.chains.push(chain);
        self
    }
}

impl fmt::Display for FilterGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, chain) in self.chains.iter().enumerate() {
            if i > 0 {
                f.write_str(";")?;
            }
            write!(f, "{}", chain)?;
        }
        Ok(())
    }
}

/// Join plain filters into a `-vf` argument.
pub fn join_filters(filters: &[Filter]) -> String {
    filters
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}
