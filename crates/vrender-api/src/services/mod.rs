//! Background and render services.

pub mod job_reaper;
pub mod render_orchestrator;

pub use job_reaper::JobReaper;
pub use render_orchestrator::{RenderHandle, RenderOrchestrator};
