//! Background service forgetting finished render jobs.
//!
//! Only runs when a retention window is configured. Running jobs are
//! never removed, whatever their age.

use std::time::Duration;

use chrono::Utc;
use tokio::time::interval;
use tracing::{error, info};

use vrender_queue::JobRegistry;

use crate::metrics;

/// Interval between sweeps.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Retention sweeper for the job registry.
pub struct JobReaper {
    jobs: JobRegistry,
    retention: Option<Duration>,
}

impl JobReaper {
    pub fn new(jobs: JobRegistry, retention: Option<Duration>) -> Self {
        Self { jobs, retention }
    }

    /// Start the background sweep loop.
    ///
    /// Returns immediately when no retention window is set; otherwise runs
    /// forever and should be spawned as a background task.
    pub async fn run(&self) {
        let Some(retention) = self.retention else {
            info!("Job retention disabled, finished jobs are kept");
            return;
        };

        info!(
            "Starting job reaper (retention: {:?}, interval: {:?})",
            retention, SWEEP_INTERVAL
        );

        let mut ticker = interval(SWEEP_INTERVAL);
        loop {
            ticker.tick().await;

            if let Err(e) = self.sweep_once(retention).await {
                error!("Job reaper sweep failed: {}", e);
            }
        }
    }

    /// Remove jobs that finished more than `retention` ago.
    pub async fn sweep_once(&self, retention: Duration) -> anyhow::Result<usize> {
        let cutoff = Utc::now() - chrono::Duration::from_std(retention)?;
        let removed = self.jobs.purge_finished_before(cutoff).await?;

        if removed > 0 {
            metrics::record_jobs_purged(removed);
            info!("Job reaper removed {} finished jobs", removed);
        }
        Ok(removed)
    }
}
