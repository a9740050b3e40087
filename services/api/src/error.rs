//! services/api/src/error.rs
//!
//! Defines the primary error type for the entire API service and its
//! mapping onto HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use tracing::error;

use crate::config::ConfigError;
use study_tracker_core::ports::PortError;

/// The primary error type for the `api` service.
///
/// Every handler returns `Result<_, ApiError>`; the `IntoResponse` impl below
/// is the single place where errors become HTTP statuses and JSON bodies.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A request field was missing or failed a basic type/range check.
    #[error("{0}")]
    Validation(String),

    /// A referenced entity does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The external AI service cannot be used because no credential is
    /// configured. Fatal and non-retryable, hence 503 rather than 500.
    #[error("AI service is not configured: {0}")]
    NotConfigured(String),

    /// The external AI call failed, timed out, or returned no text.
    #[error("AI generation failed: {0}")]
    Upstream(String),

    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            ApiError::NotFound(msg) | ApiError::Port(PortError::NotFound(msg)) => {
                (StatusCode::NOT_FOUND, json!({ "error": msg }))
            }
            ApiError::NotConfigured(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                json!({
                    "error": "AI service is not configured",
                    "message": msg,
                }),
            ),
            ApiError::Upstream(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({
                    "error": "AI generation failed",
                    "message": msg,
                }),
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": self.to_string() }),
            ),
        };

        if status.is_server_error() {
            error!("request failed: {:?}", self);
        }

        (status, Json(body)).into_response()
    }
}

/// Fallback for anything under `/api` that matched no route.
pub async fn api_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "Resource not found" })),
    )
        .into_response()
}
