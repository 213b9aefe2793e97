//! FFmpeg CLI wrapper for multi-clip rendering.
//!
//! This crate provides:
//! - A typed filter graph with a single serializer and escaping rules
//! - Pure argument plans for tracked and synchronous renders
//! - Progress parsing from FFmpeg's `time=` stats
//! - A process runner trait with the FFmpeg implementation
//! - Temporary subtitle assets for caption burn-in

pub mod assets;
pub mod command;
pub mod error;
pub mod filters;
pub mod progress;
pub mod render;

pub use assets::SubtitleAsset;
pub use command::{
    check_ffmpeg, output_exists, run_collecting, ExitOutcome, FfmpegCommand, FfmpegInput, FfmpegRunner,
    ProcessRunner,
};
pub use error::{MediaError, MediaResult};
pub use filters::{escape_filter_path, escape_filter_value, Filter, FilterChain, FilterGraph};
pub use progress::{chunk_progress, parse_time_seconds, progress_percent};
pub use render::{
    build_legacy_command, build_render_args, build_render_command, output_file_name,
    RenderOptions,
};
