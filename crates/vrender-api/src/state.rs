//! Application state.

use std::sync::Arc;

use vrender_media::{FfmpegRunner, ProcessRunner};
use vrender_queue::JobRegistry;

use crate::config::ApiConfig;
use crate::services::RenderOrchestrator;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ApiConfig>,
    pub jobs: JobRegistry,
    pub runner: Arc<dyn ProcessRunner>,
    pub orchestrator: RenderOrchestrator,
}

impl AppState {
    /// State backed by the in-memory registry and the FFmpeg binary.
    pub fn new(config: ApiConfig) -> Self {
        let runner = FfmpegRunner::new(config.ffmpeg_path.clone())
            .with_timeout(config.render_timeout_secs);
        Self::with_components(config, JobRegistry::in_memory(), Arc::new(runner))
    }

    /// State with an explicit registry and process runner.
    pub fn with_components(
        config: ApiConfig,
        jobs: JobRegistry,
        runner: Arc<dyn ProcessRunner>,
    ) -> Self {
        let config = Arc::new(config);
        let orchestrator =
            RenderOrchestrator::new(jobs.clone(), Arc::clone(&runner), Arc::clone(&config));
        Self {
            config,
            jobs,
            runner,
            orchestrator,
        }
    }
}
