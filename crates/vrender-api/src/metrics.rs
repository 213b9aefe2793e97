//! Prometheus metrics for the API server.

use std::sync::LazyLock;
use std::time::Instant;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use regex_lite::Regex;

/// Initialize the Prometheus metrics recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> anyhow::Result<PrometheusHandle> {
    Ok(PrometheusBuilder::new().install_recorder()?)
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "vrender_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "vrender_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "vrender_http_requests_in_flight";

    // Render job metrics
    pub const JOBS_STARTED_TOTAL: &str = "vrender_jobs_started_total";
    pub const JOBS_COMPLETED_TOTAL: &str = "vrender_jobs_completed_total";
    pub const JOBS_FAILED_TOTAL: &str = "vrender_jobs_failed_total";
    pub const JOBS_RUNNING: &str = "vrender_jobs_running";
    pub const JOBS_PURGED_TOTAL: &str = "vrender_jobs_purged_total";

    // Processing metrics
    pub const FFMPEG_DURATION_SECONDS: &str = "vrender_ffmpeg_duration_seconds";

    // Rate limiting metrics
    pub const RATE_LIMIT_HITS_TOTAL: &str = "vrender_rate_limit_hits_total";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record a tracked render being started.
pub fn record_job_started(preset: &str) {
    let labels = [("preset", preset.to_string())];
    counter!(names::JOBS_STARTED_TOTAL, &labels).increment(1);
    gauge!(names::JOBS_RUNNING).increment(1.0);
}

/// Record job completed.
pub fn record_job_completed(preset: &str) {
    let labels = [("preset", preset.to_string())];
    counter!(names::JOBS_COMPLETED_TOTAL, &labels).increment(1);
    gauge!(names::JOBS_RUNNING).decrement(1.0);
}

/// Record job failed.
pub fn record_job_failed(preset: &str) {
    let labels = [("preset", preset.to_string())];
    counter!(names::JOBS_FAILED_TOTAL, &labels).increment(1);
    gauge!(names::JOBS_RUNNING).decrement(1.0);
}

/// Record finished jobs removed by the retention sweeper.
pub fn record_jobs_purged(count: usize) {
    counter!(names::JOBS_PURGED_TOTAL).increment(count as u64);
}

/// Record FFmpeg processing duration.
pub fn record_ffmpeg_duration(mode: &str, duration_secs: f64) {
    let labels = [("mode", mode.to_string())];
    histogram!(names::FFMPEG_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record rate limit hit.
pub fn record_rate_limit_hit(endpoint: &str) {
    let labels = [("endpoint", sanitize_path(endpoint))];
    counter!(names::RATE_LIMIT_HITS_TOTAL, &labels).increment(1);
}

static JOB_STATUS_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/render/status/[^/]+").expect("valid job path pattern"));

static UPLOADS_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/uploads/.+").expect("valid uploads path pattern"));

/// Sanitize path for metrics labels (remove IDs, etc.).
fn sanitize_path(path: &str) -> String {
    let path = JOB_STATUS_PATH.replace_all(path, "/render/status/:job_id");
    let path = UPLOADS_PATH.replace_all(&path, "/uploads/:file");
    path.to_string()
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);

    let response = next.run(request).await;

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    let status = response.status().as_u16();
    let duration = start.elapsed().as_secs_f64();

    record_http_request(&method, &path, status, duration);

    response
}
