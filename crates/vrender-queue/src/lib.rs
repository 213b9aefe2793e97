//! Render job registry.
//!
//! Jobs live behind the [`JobStore`] trait so the in-memory backend can be
//! replaced by a persistent one without touching callers.

pub mod error;
pub mod registry;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use registry::JobRegistry;
pub use store::{JobMutation, JobStore, MemoryJobStore};
