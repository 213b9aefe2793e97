//! Shared data models for the render orchestrator.
//!
//! This crate provides Serde-serializable types for:
//! - Render jobs and their lifecycle states
//! - Clip specifications and export presets
//! - Encoding constants shared by the argument builders
//! - HTTP request/response payloads

pub mod clip;
pub mod encoding;
pub mod job;
pub mod render;

// Re-export common types
pub use clip::ClipSpec;
pub use encoding::{ExportPreset, ParsePresetError, PresetSpec};
pub use job::{JobId, JobStatus, RenderJob};
pub use render::{
    JobStatusResponse, LegacyRenderRequest, LegacyRenderResponse, RenderStartRequest,
    RenderStartResponse, CLIPS_REQUIRED,
};
