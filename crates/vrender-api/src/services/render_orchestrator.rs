//! Tracked render execution.
//!
//! A submitted render is registered as `running` before its process starts.
//! A supervisor task then owns the job: it folds every diagnostic chunk into
//! the job's log and progress, and records the terminal state once the
//! process exits.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle};
use tracing::{info, warn};

use vrender_media::{
    build_render_args, chunk_progress, output_exists, output_file_name, ExitOutcome, MediaError,
    MediaResult, ProcessRunner, RenderOptions, SubtitleAsset,
};
use vrender_models::{JobId, RenderJob, RenderStartRequest};
use vrender_queue::JobRegistry;

use crate::config::ApiConfig;
use crate::error::ApiResult;
use crate::metrics;

/// A submitted render.
///
/// Dropping the handle detaches the supervisor; the render keeps going.
#[derive(Debug)]
pub struct RenderHandle {
    job_id: JobId,
    task: JoinHandle<()>,
}

impl RenderHandle {
    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }

    /// Wait until the job reached a terminal state.
    pub async fn finished(self) -> Result<(), JoinError> {
        self.task.await
    }
}

/// Starts renders and supervises them to completion.
#[derive(Clone)]
pub struct RenderOrchestrator {
    jobs: JobRegistry,
    runner: Arc<dyn ProcessRunner>,
    config: Arc<ApiConfig>,
}

impl RenderOrchestrator {
    pub fn new(jobs: JobRegistry, runner: Arc<dyn ProcessRunner>, config: Arc<ApiConfig>) -> Self {
        Self {
            jobs,
            runner,
            config,
        }
    }

    /// Register a job for `req` and start rendering it in the background.
    ///
    /// Nothing is registered when preparing the render fails.
    pub async fn submit(&self, req: &RenderStartRequest) -> ApiResult<RenderHandle> {
        let videos_dir = self.config.videos_dir();
        tokio::fs::create_dir_all(&videos_dir)
            .await
            .map_err(MediaError::from)?;

        let file_name = output_file_name();
        let output = videos_dir.join(&file_name);

        let subtitle = req
            .subtitle_content()
            .map(|srt| SubtitleAsset::write(&videos_dir, srt))
            .transpose()?;

        let preset = req.export_preset();
        let options = RenderOptions {
            preset,
            burn_in_captions: req.burn_in_captions,
            subtitle_path: subtitle.as_ref().map(|s| s.path().to_path_buf()),
        };
        let args = build_render_args(&req.clips, &options, &output)?;

        let job = RenderJob::new(JobId::new(), req.duration);
        let job_id = job.id.clone();
        self.jobs.register(job).await?;

        let preset_label = preset.map_or("default", |p| p.as_str());
        metrics::record_job_started(preset_label);
        info!(
            job_id = %job_id,
            clips = req.clips.len(),
            preset = preset_label,
            captions = subtitle.is_some(),
            output = %output.display(),
            "Render job started"
        );

        let supervisor = Supervisor {
            jobs: self.jobs.clone(),
            runner: Arc::clone(&self.runner),
            job_id: job_id.clone(),
            preset: preset_label,
            output,
            output_url: self.config.public_video_url(&file_name),
            subtitle,
        };
        let task = tokio::spawn(supervisor.run(args));

        Ok(RenderHandle { job_id, task })
    }
}

/// Sole writer of one job's record while its process runs.
struct Supervisor {
    jobs: JobRegistry,
    runner: Arc<dyn ProcessRunner>,
    job_id: JobId,
    preset: &'static str,
    output: PathBuf,
    output_url: String,
    subtitle: Option<SubtitleAsset>,
}

impl Supervisor {
    async fn run(mut self, args: Vec<String>) {
        let started = Instant::now();
        let (tx, mut rx) = mpsc::unbounded_channel();

        let result = {
            let process = self.runner.run(args, tx);
            tokio::pin!(process);
            loop {
                tokio::select! {
                    biased;
                    Some(chunk) = rx.recv() => self.record_chunk(&chunk).await,
                    result = &mut process => break result,
                }
            }
        };
        while let Ok(chunk) = rx.try_recv() {
            self.record_chunk(&chunk).await;
        }

        metrics::record_ffmpeg_duration("tracked", started.elapsed().as_secs_f64());
        self.finish(result).await;

        if let Some(subtitle) = self.subtitle.take() {
            subtitle.release();
        }
    }

    async fn record_chunk(&self, chunk: &str) {
        let updated = self
            .jobs
            .update(&self.job_id, |job| {
                job.append_log(chunk);
                if let Some(percent) = chunk_progress(chunk, job.expected_duration) {
                    job.record_progress(percent);
                }
            })
            .await;
        if let Err(e) = updated {
            warn!(job_id = %self.job_id, "Failed to record render output: {}", e);
        }
    }

    async fn finish(&self, result: MediaResult<ExitOutcome>) {
        let exit_code = match &result {
            Ok(outcome) => outcome.code,
            Err(_) => None,
        };
        let succeeded = match &result {
            Ok(outcome) => outcome.success() && output_exists(&self.output).await,
            Err(_) => false,
        };

        let updated = self
            .jobs
            .update(&self.job_id, |job| {
                if let Err(e) = &result {
                    job.append_log(&format!("\n{}\n", e));
                }
                if succeeded {
                    job.complete(self.output_url.clone());
                } else {
                    job.fail();
                }
            })
            .await;

        if let Err(e) = updated {
            warn!(job_id = %self.job_id, "Failed to record render result: {}", e);
        }

        if succeeded {
            metrics::record_job_completed(self.preset);
            info!(job_id = %self.job_id, url = %self.output_url, "Render job completed");
        } else {
            metrics::record_job_failed(self.preset);
            match &result {
                Err(e) => warn!(job_id = %self.job_id, "Render job failed: {}", e),
                Ok(_) => warn!(job_id = %self.job_id, exit_code = ?exit_code, "Render job failed"),
            }
        }
    }
}
