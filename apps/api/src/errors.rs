use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::models::ValidationError;

/// Failure of the text-completion collaborator. Localized to one rewrite call.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Text completion is not configured")]
    Unavailable,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Completion returned empty content")]
    EmptyContent,

    #[error("Completion timed out after {0:?}")]
    Timeout(Duration),

    #[error("Rewrite was cancelled")]
    Cancelled,
}

/// Failure of the persistence or renderer collaborators. In-memory state stays valid.
#[derive(Debug, Error)]
pub enum IoError {
    #[error("No snapshot stored for document {0}")]
    SnapshotNotFound(Uuid),

    #[error("Filesystem error: {0}")]
    Fs(#[from] std::io::Error),

    #[error("Snapshot encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("Renderer is not configured")]
    RendererUnavailable,

    #[error("Renderer HTTP error: {0}")]
    RendererHttp(#[from] reqwest::Error),

    #[error("Renderer error (status {status}): {message}")]
    Render { status: u16, message: String },
}

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid document: {0}")]
    Validation(#[from] ValidationError),

    #[error("Rewrite failed: {0}")]
    Service(#[from] ServiceError),

    #[error("I/O failed: {0}")]
    Io(#[from] IoError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(e) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "VALIDATION_ERROR",
                e.to_string(),
            ),
            AppError::Service(e) => {
                tracing::warn!("Rewrite error: {e}");
                let (status, code) = match e {
                    ServiceError::Unavailable => {
                        (StatusCode::SERVICE_UNAVAILABLE, "REWRITE_UNAVAILABLE")
                    }
                    ServiceError::Timeout(_) => (StatusCode::GATEWAY_TIMEOUT, "REWRITE_TIMEOUT"),
                    ServiceError::Cancelled => (StatusCode::CONFLICT, "REWRITE_CANCELLED"),
                    _ => (StatusCode::BAD_GATEWAY, "REWRITE_FAILED"),
                };
                (status, code, e.to_string())
            }
            AppError::Io(IoError::SnapshotNotFound(id)) => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("No snapshot stored for document {id}"),
            ),
            AppError::Io(IoError::RendererUnavailable) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "RENDERER_UNAVAILABLE",
                "Document export is not configured".to_string(),
            ),
            AppError::Io(e @ (IoError::RendererHttp(_) | IoError::Render { .. })) => {
                tracing::warn!("Renderer error: {e}");
                (
                    StatusCode::BAD_GATEWAY,
                    "RENDER_FAILED",
                    "The document renderer failed".to_string(),
                )
            }
            AppError::Io(e) => {
                tracing::error!("Storage error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORAGE_ERROR",
                    "A storage error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
