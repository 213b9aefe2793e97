//! Render handlers.

use std::time::Instant;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use tracing::{debug, info, warn};

use vrender_media::{
    build_legacy_command, output_exists, output_file_name, run_collecting, MediaError,
};
use vrender_models::{
    JobId, JobStatusResponse, LegacyRenderRequest, LegacyRenderResponse, RenderStartRequest,
    RenderStartResponse, CLIPS_REQUIRED,
};

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;

/// Message of a failed synchronous render.
const FFMPEG_FAILED: &str = "FFmpeg failed";

/// Unwrap a JSON body, answering 400 with `missing` when no JSON was sent.
fn json_body<T>(payload: Result<Json<T>, JsonRejection>, missing: &str) -> ApiResult<T> {
    match payload {
        Ok(Json(body)) => Ok(body),
        Err(JsonRejection::MissingJsonContentType(_)) => Err(ApiError::bad_request(missing)),
        Err(rejection) => Err(ApiError::bad_request(rejection.body_text())),
    }
}

/// Like [`json_body`], but well-formed JSON of the wrong shape also answers
/// with `missing`.
fn shaped_json_body<T>(payload: Result<Json<T>, JsonRejection>, missing: &str) -> ApiResult<T> {
    match payload {
        Err(JsonRejection::JsonDataError(e)) => {
            debug!("Rejected render body: {}", e.body_text());
            Err(ApiError::bad_request(missing))
        }
        other => json_body(other, missing),
    }
}

/// Start a tracked render.
///
/// POST /api/render/start
pub async fn start_render(
    State(state): State<AppState>,
    payload: Result<Json<RenderStartRequest>, JsonRejection>,
) -> ApiResult<Json<RenderStartResponse>> {
    let req = shaped_json_body(payload, CLIPS_REQUIRED)?;
    req.validate_all()?;

    let handle = state.orchestrator.submit(&req).await?;

    Ok(Json(RenderStartResponse {
        ok: true,
        job_id: handle.job_id().clone(),
    }))
}

/// Current snapshot of a tracked render.
///
/// GET /api/render/status/:jobId
pub async fn get_render_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<JobStatusResponse>> {
    let job = state
        .jobs
        .get(&JobId::from_string(job_id))
        .await?
        .ok_or_else(|| ApiError::not_found("job not found"))?;

    Ok(Json(JobStatusResponse { ok: true, job }))
}

/// Render and wait for the result.
///
/// POST /api/render
pub async fn render_sync(
    State(state): State<AppState>,
    payload: Result<Json<LegacyRenderRequest>, JsonRejection>,
) -> ApiResult<Json<LegacyRenderResponse>> {
    let req = json_body(payload, &MediaError::MissingInput.to_string())?;

    let videos_dir = state.config.videos_dir();
    let file_name = output_file_name();
    let output = videos_dir.join(&file_name);
    let cmd = build_legacy_command(&req, &output)?;
    tokio::fs::create_dir_all(&videos_dir)
        .await
        .map_err(MediaError::from)?;

    info!(inputs = cmd.inputs().len(), output = %file_name, "Synchronous render started");
    let started = Instant::now();
    let result = run_collecting(state.runner.as_ref(), cmd.build_args()).await;
    metrics::record_ffmpeg_duration("sync", started.elapsed().as_secs_f64());

    match result {
        Ok((outcome, _)) if outcome.success() && output_exists(&output).await => {
            info!(output = %file_name, "Synchronous render completed");
            let url = state.config.public_video_url(&file_name);
            Ok(Json(LegacyRenderResponse {
                ok: true,
                file: file_name,
                url,
            }))
        }
        Ok((outcome, stderr)) => {
            warn!(exit_code = ?outcome.code, output = %file_name, "Synchronous render failed");
            Err(ApiError::render_failed(FFMPEG_FAILED, stderr))
        }
        Err(e) => {
            warn!("Synchronous render could not run: {}", e);
            Err(ApiError::render_failed(FFMPEG_FAILED, e.to_string()))
        }
    }
}
