//! Axum HTTP API server.
//!
//! This crate provides:
//! - Tracked renders with pollable job status
//! - Synchronous single-request renders
//! - Static serving of rendered outputs
//! - Rate limiting, security headers and Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use services::{JobReaper, RenderHandle, RenderOrchestrator};
pub use state::AppState;
