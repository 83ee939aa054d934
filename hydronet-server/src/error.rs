//! Error types and handling for the server.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// API error types.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unknown branch: {0}")]
    UnknownBranch(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Processing error: {0}")]
    Processing(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Join error")]
    Join(#[from] tokio::task::JoinError),
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::UnknownBranch(_) => (StatusCode::NOT_FOUND, "UNKNOWN_BRANCH"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Processing(_) => (StatusCode::UNPROCESSABLE_ENTITY, "PROCESSING_ERROR"),
            ApiError::Timeout => (StatusCode::REQUEST_TIMEOUT, "TIMEOUT"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            ApiError::Join(_) => (StatusCode::INTERNAL_SERVER_ERROR, "TASK_ERROR"),
        };

        if status.is_server_error() {
            tracing::error!(code, "{self}");
        }

        let body = ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<hydronet_core::Error> for ApiError {
    fn from(err: hydronet_core::Error) -> Self {
        match err {
            hydronet_core::Error::InvalidLocations | hydronet_core::Error::Comparison => {
                ApiError::BadRequest(err.to_string())
            }
            other => ApiError::Processing(other.to_string()),
        }
    }
}

/// Maps failures of the tower middleware stack to API errors.
pub async fn handle_middleware_error(err: tower::BoxError) -> ApiError {
    if err.is::<tower::timeout::error::Elapsed>() {
        ApiError::Timeout
    } else {
        ApiError::Internal(err.to_string())
    }
}
