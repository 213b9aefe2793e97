//! Health check handlers.

use std::path::Path;
use std::time::Instant;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use vrender_media::check_ffmpeg;

use crate::state::AppState;

/// Health response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
}

/// Health check endpoint (liveness probe).
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// Readiness of the render dependencies.
#[derive(Serialize)]
pub struct ReadinessResponse {
    pub status: &'static str,
    pub checks: ReadinessChecks,
}

#[derive(Serialize)]
pub struct ReadinessChecks {
    pub ffmpeg: Check,
    pub uploads: Check,
}

/// Outcome of one readiness probe.
#[derive(Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Check {
    Ok { latency_ms: u64 },
    Error { error: String },
}

impl Check {
    fn timed(start: Instant, result: Result<(), String>) -> Self {
        match result {
            Ok(()) => Check::Ok {
                latency_ms: start.elapsed().as_millis() as u64,
            },
            Err(error) => Check::Error { error },
        }
    }

    fn is_ok(&self) -> bool {
        matches!(self, Check::Ok { .. })
    }
}

async fn videos_dir_writable(dir: &Path) -> Result<(), String> {
    let meta = tokio::fs::metadata(dir)
        .await
        .map_err(|e| format!("{}: {}", dir.display(), e))?;
    if meta.is_dir() && !meta.permissions().readonly() {
        Ok(())
    } else {
        Err(format!("{} is not a writable directory", dir.display()))
    }
}

/// Readiness probe: FFmpeg resolvable and the output directory writable.
///
/// Answers 503 with the same body when any check fails.
pub async fn ready(State(state): State<AppState>) -> (StatusCode, Json<ReadinessResponse>) {
    let start = Instant::now();
    let ffmpeg = Check::timed(
        start,
        check_ffmpeg(&state.config.ffmpeg_path)
            .map(|_| ())
            .map_err(|e| e.to_string()),
    );

    let start = Instant::now();
    let uploads = Check::timed(start, videos_dir_writable(&state.config.videos_dir()).await);

    let all_ok = ffmpeg.is_ok() && uploads.is_ok();
    let (code, status) = if all_ok {
        (StatusCode::OK, "ready")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (
        code,
        Json(ReadinessResponse {
            status,
            checks: ReadinessChecks { ffmpeg, uploads },
        }),
    )
}
