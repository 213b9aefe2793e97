//! API error types.

use std::sync::atomic::{AtomicBool, Ordering};

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use validator::{ValidationErrors, ValidationErrorsKind};

use vrender_media::MediaError;
use vrender_queue::StoreError;

pub type ApiResult<T> = Result<T, ApiError>;

static HIDE_INTERNAL: AtomicBool = AtomicBool::new(false);

/// Replace internal error messages with a generic one in responses.
///
/// Set once at startup from [`ApiConfig::is_production`](crate::ApiConfig::is_production).
pub fn hide_internal_errors(hide: bool) {
    HIDE_INTERNAL.store(hide, Ordering::Relaxed);
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    /// Render process exited unsuccessfully; `details` carries its diagnostics.
    #[error("{message}")]
    RenderFailed { message: String, details: String },

    #[error(transparent)]
    Media(#[from] MediaError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl ApiError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn render_failed(msg: impl Into<String>, details: impl Into<String>) -> Self {
        Self::RenderFailed {
            message: msg.into(),
            details: details.into(),
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Media(e) if e.is_invalid_input() => StatusCode::BAD_REQUEST,
            ApiError::RenderFailed { .. }
            | ApiError::Media(_)
            | ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn is_internal(&self) -> bool {
        match self {
            ApiError::Store(_) => true,
            ApiError::Media(e) => !e.is_invalid_input(),
            _ => false,
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let message = first_message(&errors).unwrap_or_else(|| "invalid request".to_string());
        Self::BadRequest(message)
    }
}

fn first_message(errors: &ValidationErrors) -> Option<String> {
    for kind in errors.errors().values() {
        let found = match kind {
            ValidationErrorsKind::Field(errs) => errs.first().map(|e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string())
            }),
            ValidationErrorsKind::Struct(inner) => first_message(inner),
            ValidationErrorsKind::List(items) => items.values().find_map(|inner| first_message(inner)),
        };
        if found.is_some() {
            return found;
        }
    }
    None
}

#[derive(Serialize)]
struct ErrorResponse {
    ok: bool,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Don't expose internal error details in production
        let error = if self.is_internal() && HIDE_INTERNAL.load(Ordering::Relaxed) {
            "An internal error occurred".to_string()
        } else {
            self.to_string()
        };

        let details = match self {
            ApiError::RenderFailed { details, .. } => Some(details),
            _ => None,
        };

        let body = ErrorResponse {
            ok: false,
            error,
            details,
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;
    use validator::Validate;
    use vrender_models::{RenderStartRequest, CLIPS_REQUIRED};

    use super::*;

    async fn body_json(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_not_found_body() {
        let (status, body) = body_json(ApiError::not_found("job not found")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["ok"], false);
        assert_eq!(body["error"], "job not found");
        assert!(body.get("details").is_none());
    }

    #[tokio::test]
    async fn test_render_failed_carries_details() {
        let (status, body) =
            body_json(ApiError::render_failed("FFmpeg failed", "No such file or directory")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "FFmpeg failed");
        assert_eq!(body["details"], "No such file or directory");
    }

    #[tokio::test]
    async fn test_invalid_media_input_is_bad_request() {
        let (status, body) = body_json(MediaError::EmptyClipList.into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], CLIPS_REQUIRED);
    }

    #[tokio::test]
    async fn test_internal_message_hidden_when_configured() {
        let production = crate::ApiConfig {
            environment: "Production".to_string(),
            ..Default::default()
        };
        hide_internal_errors(production.is_production());
        let (status, hidden) = body_json(MediaError::Timeout(30).into()).await;
        let (_, invalid) = body_json(MediaError::MissingInput.into()).await;
        hide_internal_errors(false);

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(hidden["error"], "An internal error occurred");
        assert_eq!(invalid["error"], "inputUrl or clips[] is required");

        let (_, shown) = body_json(MediaError::Timeout(30).into()).await;
        assert_eq!(shown["error"], "Operation timed out after 30 seconds");
    }

    #[test]
    fn test_validation_message() {
        let errors = RenderStartRequest::default().validate().unwrap_err();
        match ApiError::from(errors) {
            ApiError::BadRequest(msg) => assert_eq!(msg, CLIPS_REQUIRED),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
