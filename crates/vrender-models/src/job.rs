//! Render job model and lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a render job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new job ID (`job_<unix-ms>_<random>`).
    pub fn new() -> Self {
        let random = Uuid::new_v4().simple().to_string();
        Self(format!("job_{}_{}", Utc::now().timestamp_millis(), &random[..12]))
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Render job status.
///
/// `Running` moves to exactly one of the terminal states and never leaves it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// FFmpeg has been (or is being) spawned
    #[default]
    Running,
    /// Process exited 0 and the output file exists
    Completed,
    /// Non-zero exit, spawn error, timeout, or missing output
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// Whether the state machine allows moving from `self` to `next`.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Running, JobStatus::Completed) | (JobStatus::Running, JobStatus::Failed)
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One in-flight or finished render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderJob {
    pub id: JobId,
    pub status: JobStatus,
    /// Progress percentage (0-100)
    pub progress: u8,
    /// Expected output duration in seconds, if known
    pub expected_duration: Option<f64>,
    /// Raw FFmpeg diagnostic output
    pub accumulated_log: String,
    /// Public URL of the rendered file, set on completion
    pub output_url: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl RenderJob {
    /// Create a running job with zero progress.
    ///
    /// Non-positive or non-finite durations are treated as unknown.
    pub fn new(id: JobId, expected_duration: Option<f64>) -> Self {
        Self {
            id,
            status: JobStatus::Running,
            progress: 0,
            expected_duration: expected_duration.filter(|d| d.is_finite() && *d > 0.0),
            accumulated_log: String::new(),
            output_url: None,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Append a chunk of diagnostic output.
    pub fn append_log(&mut self, chunk: &str) {
        self.accumulated_log.push_str(chunk);
    }

    /// Record a progress percentage.
    ///
    /// Ignored once terminal; never lowers the recorded value.
    pub fn record_progress(&mut self, percent: u8) {
        if self.is_terminal() {
            return;
        }
        self.progress = self.progress.max(percent.min(100));
    }

    /// Mark the job completed with its output URL.
    ///
    /// Returns `false` if the job was already terminal.
    pub fn complete(&mut self, output_url: impl Into<String>) -> bool {
        if !self.status.can_transition_to(JobStatus::Completed) {
            return false;
        }
        self.status = JobStatus::Completed;
        self.progress = 100;
        self.output_url = Some(output_url.into());
        self.finished_at = Some(Utc::now());
        true
    }

    /// Mark the job failed.
    ///
    /// Returns `false` if the job was already terminal.
    pub fn fail(&mut self) -> bool {
        if !self.status.can_transition_to(JobStatus::Failed) {
            return false;
        }
        self.status = JobStatus::Failed;
        self.output_url = None;
        self.finished_at = Some(Utc::now());
        true
    }

    /// Whether the job finished strictly before `cutoff`.
    pub fn finished_before(&self, cutoff: DateTime<Utc>) -> bool {
        self.finished_at.is_some_and(|t| t < cutoff)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_job_is_running() {
        let job = RenderJob::new(JobId::new(), Some(20.0));
        assert_eq!(job.status, JobStatus::Running);
        assert_eq!(job.progress, 0);
        assert_eq!(job.expected_duration, Some(20.0));
        assert!(job.output_url.is_none());
        assert!(job.finished_at.is_none());
    }

    #[test]
    fn test_unknown_duration() {
        assert_eq!(RenderJob::new(JobId::new(), Some(0.0)).expected_duration, None);
        assert_eq!(RenderJob::new(JobId::new(), Some(-3.0)).expected_duration, None);
        assert_eq!(RenderJob::new(JobId::new(), Some(f64::NAN)).expected_duration, None);
    }

    #[test]
    fn test_progress_is_monotonic() {
        let mut job = RenderJob::new(JobId::new(), Some(10.0));
        job.record_progress(40);
        job.record_progress(25);
        assert_eq!(job.progress, 40);
        job.record_progress(250);
        assert_eq!(job.progress, 100);
    }

    #[test]
    fn test_complete_transition() {
        let mut job = RenderJob::new(JobId::new(), None);
        assert!(job.complete("/uploads/videos/render_1.mp4"));
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.progress, 100);
        assert!(job.finished_at.is_some());

        // Terminal states are final
        assert!(!job.fail());
        assert_eq!(job.status, JobStatus::Completed);
    }

    #[test]
    fn test_fail_transition() {
        let mut job = RenderJob::new(JobId::new(), Some(10.0));
        job.record_progress(30);
        assert!(job.fail());
        assert_eq!(job.status, JobStatus::Failed);
        assert!(job.output_url.is_none());
        assert!(job.finished_at.is_some());
        assert!(!job.complete("/x.mp4"));

        job.record_progress(90);
        assert_eq!(job.progress, 30);
    }

    #[test]
    fn test_status_transitions() {
        assert!(JobStatus::Running.can_transition_to(JobStatus::Completed));
        assert!(JobStatus::Running.can_transition_to(JobStatus::Failed));
        assert!(!JobStatus::Completed.can_transition_to(JobStatus::Failed));
        assert!(!JobStatus::Failed.can_transition_to(JobStatus::Running));
        assert!(!JobStatus::Running.can_transition_to(JobStatus::Running));
    }

    #[test]
    fn test_job_ids_are_unique() {
        let a = JobId::new();
        let b = JobId::new();
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("job_"));
    }

    #[test]
    fn test_serializes_camel_case() {
        let job = RenderJob::new(JobId::from_string("job_1"), None);
        let value = serde_json::to_value(&job).unwrap();
        assert_eq!(value["id"], "job_1");
        assert_eq!(value["status"], "running");
        assert_eq!(value["progress"], 0);
        assert!(value["expectedDuration"].is_null());
        assert!(value["outputUrl"].is_null());
        assert!(value["finishedAt"].is_null());
        assert_eq!(value["accumulatedLog"], "");
        assert!(value["startedAt"].is_string());
    }
}
