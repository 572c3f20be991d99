//! Error types for GeminiPy
//!
//! Every error is converted into a client-visible response at the handler
//! boundary. The body is always `{"detail": "..."}`.

use std::fmt::Display;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Application-level errors
#[derive(Debug, Error)]
pub enum AppError {
    /// No API key in either the `X-API-Key` header or the `api_key` query parameter
    #[error(
        "API key missing. Provide your Gemini API key in the 'X-API-Key' header \
         or the 'api_key' query parameter"
    )]
    Unauthenticated,

    /// Upstream answered with a non-success status; the raw body is relayed
    #[error("Upstream error {status}: {body}")]
    UpstreamError { status: StatusCode, body: String },

    /// Network failure, timeout or malformed upstream response
    #[error("Internal server error ({context}): {message}")]
    RelayFailure { context: String, message: String },

    #[error("Not Found")]
    NotFound,
}

impl AppError {
    /// Build a relay failure labelled with the namespace/mode it happened in
    pub fn relay_failure(context: impl Into<String>, cause: impl Display) -> Self {
        AppError::RelayFailure {
            context: context.into(),
            message: cause.to_string(),
        }
    }

    /// HTTP status this error is surfaced with
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::UpstreamError { status, .. } => *status,
            AppError::RelayFailure { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound => StatusCode::NOT_FOUND,
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub detail: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match self {
            // Callers inspect the upstream's own error schema, so pass it through untouched.
            AppError::UpstreamError { body, .. } => body,
            other => other.to_string(),
        };

        (status, Json(ErrorResponse { detail })).into_response()
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;
