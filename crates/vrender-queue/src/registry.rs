//! Render job registry.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;
use vrender_models::{JobId, RenderJob};

use crate::error::StoreResult;
use crate::store::{JobStore, MemoryJobStore};

/// Shared view of every job the service knows about.
///
/// Each job has a single writer (its supervisor), which edits the record in
/// place through [`JobRegistry::update`].
#[derive(Clone)]
pub struct JobRegistry {
    store: Arc<dyn JobStore>,
}

impl JobRegistry {
    pub fn new(store: Arc<dyn JobStore>) -> Self {
        Self { store }
    }

    /// Registry backed by a [`MemoryJobStore`].
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryJobStore::new()))
    }

    pub async fn register(&self, job: RenderJob) -> StoreResult<()> {
        debug!("Registering job {}", job.id);
        self.store.set(job).await
    }

    pub async fn get(&self, id: &JobId) -> StoreResult<Option<RenderJob>> {
        self.store.get(id).await
    }

    /// Apply `f` to the stored job.
    pub async fn update<F>(&self, id: &JobId, f: F) -> StoreResult<()>
    where
        F: FnOnce(&mut RenderJob) + Send,
    {
        self.store.update(id, Box::new(f)).await
    }

    pub async fn remove(&self, id: &JobId) -> StoreResult<bool> {
        self.store.delete(id).await
    }

    pub async fn list(&self) -> StoreResult<Vec<RenderJob>> {
        self.store.list().await
    }

    /// Delete terminal jobs that finished before `cutoff`.
    ///
    /// Running jobs are never removed. Returns the number deleted.
    pub async fn purge_finished_before(&self, cutoff: DateTime<Utc>) -> StoreResult<usize> {
        let mut removed = 0;
        for job in self.store.list().await? {
            if job.is_terminal() && job.finished_before(cutoff) && self.store.delete(&job.id).await? {
                removed += 1;
            }
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use vrender_models::JobStatus;

    use super::*;
    use crate::error::StoreError;

    fn job(id: &str) -> RenderJob {
        RenderJob::new(JobId::from_string(id), Some(20.0))
    }

    #[tokio::test]
    async fn test_register_and_get() {
        let registry = JobRegistry::in_memory();
        registry.register(job("job_1")).await.unwrap();

        let stored = registry.get(&JobId::from_string("job_1")).await.unwrap().unwrap();
        assert_eq!(stored.status, JobStatus::Running);
        assert_eq!(stored.progress, 0);
    }

    #[tokio::test]
    async fn test_update_persists() {
        let registry = JobRegistry::in_memory();
        let id = JobId::from_string("job_1");
        registry.register(job("job_1")).await.unwrap();

        registry.update(&id, |j| j.record_progress(30)).await.unwrap();
        assert_eq!(registry.get(&id).await.unwrap().unwrap().progress, 30);
    }

    #[tokio::test]
    async fn test_update_missing_job() {
        let registry = JobRegistry::in_memory();
        let err = registry
            .update(&JobId::from_string("nope"), |j| j.record_progress(1))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::JobNotFound(_)));
    }

    #[tokio::test]
    async fn test_remove() {
        let registry = JobRegistry::in_memory();
        let id = JobId::from_string("job_1");
        registry.register(job("job_1")).await.unwrap();

        assert!(registry.remove(&id).await.unwrap());
        assert!(registry.get(&id).await.unwrap().is_none());
        assert!(!registry.remove(&id).await.unwrap());
    }

    #[tokio::test]
    async fn test_purge_keeps_running_and_recent() {
        let registry = JobRegistry::in_memory();
        registry.register(job("running")).await.unwrap();
        registry.register(job("done")).await.unwrap();
        registry
            .update(&JobId::from_string("done"), |j| {
                j.complete("/uploads/videos/a.mp4");
            })
            .await
            .unwrap();

        let past = Utc::now() - Duration::hours(1);
        assert_eq!(registry.purge_finished_before(past).await.unwrap(), 0);

        let future = Utc::now() + Duration::hours(1);
        assert_eq!(registry.purge_finished_before(future).await.unwrap(), 1);

        let remaining = registry.list().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id.as_str(), "running");
    }
}
