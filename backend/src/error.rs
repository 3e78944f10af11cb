//! Error types and error handling for the application
//!
//! This module defines custom error types that can be converted to HTTP responses.
//! All errors implement `IntoResponse` to provide consistent error formatting.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-level error types
///
/// The orchestration core never returns these; they belong to the HTTP
/// adapter and configuration layer.
#[derive(Error, Debug)]
pub enum AppError {
    /// Request body is missing something or malformed
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Utterance exceeds the configured maximum
    #[error("Utterance too long ({len} > {max} characters)")]
    UtteranceTooLong {
        /// Length of the rejected utterance in characters
        len: usize,
        /// Configured maximum
        max: usize,
    },

    /// Configuration update was rejected
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl AppError {
    /// HTTP status for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::UtteranceTooLong { .. } => StatusCode::BAD_REQUEST,
            AppError::InvalidConfig(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}
