//! Job store backends.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use vrender_models::{JobId, RenderJob};

use crate::error::{StoreError, StoreResult};

/// In-place edit applied to a stored job.
pub type JobMutation<'a> = Box<dyn FnOnce(&mut RenderJob) + Send + 'a>;

/// Keyed storage for render jobs.
///
/// Implementations must make a `set` visible to every later `get`.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn get(&self, id: &JobId) -> StoreResult<Option<RenderJob>>;

    /// Insert or replace the job under its id.
    async fn set(&self, job: RenderJob) -> StoreResult<()>;

    /// Apply `f` to the stored job without copying it out.
    ///
    /// Fails with [`StoreError::JobNotFound`] when no job has that id.
    async fn update(&self, id: &JobId, f: JobMutation<'_>) -> StoreResult<()>;

    /// Returns `true` if a job was removed.
    async fn delete(&self, id: &JobId) -> StoreResult<bool>;

    async fn list(&self) -> StoreResult<Vec<RenderJob>>;
}

/// Process-local store. Contents are lost on restart.
#[derive(Debug, Default)]
pub struct MemoryJobStore {
    jobs: RwLock<HashMap<JobId, RenderJob>>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn get(&self, id: &JobId) -> StoreResult<Option<RenderJob>> {
        Ok(self.jobs.read().await.get(id).cloned())
    }

    async fn set(&self, job: RenderJob) -> StoreResult<()> {
        self.jobs.write().await.insert(job.id.clone(), job);
        Ok(())
    }

    async fn update(&self, id: &JobId, f: JobMutation<'_>) -> StoreResult<()> {
        let mut jobs = self.jobs.write().await;
        let job = jobs
            .get_mut(id)
            .ok_or_else(|| StoreError::job_not_found(id.as_str()))?;
        f(job);
        Ok(())
    }

    async fn delete(&self, id: &JobId) -> StoreResult<bool> {
        Ok(self.jobs.write().await.remove(id).is_some())
    }

    async fn list(&self) -> StoreResult<Vec<RenderJob>> {
        Ok(self.jobs.read().await.values().cloned().collect())
    }
}
