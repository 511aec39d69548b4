//! Error types for the server.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use codelab_executor::ExecutorError;
use serde::Serialize;
use thiserror::Error;

/// Error text of a 504 body.
pub const EXECUTION_TIMEOUT: &str = "Execution Timeout";

/// Server error type.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Bad request.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Request body over the configured limit.
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// The local execution budget ran out.
    #[error("{0}")]
    ExecutionTimeout(String),

    /// The execution service could not be used.
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<ExecutorError> for ServerError {
    fn from(e: ExecutorError) -> Self {
        match e {
            ExecutorError::InvalidSubmission(e) => ServerError::BadRequest(e.to_string()),
            ExecutorError::Timeout(msg) => ServerError::ExecutionTimeout(format!(
                "Code execution took too long ({})",
                msg
            )),
            ExecutorError::Config(msg) => ServerError::Config(msg),
            e @ (ExecutorError::Network(_)
            | ExecutorError::Remote { .. }
            | ExecutorError::Serialization(_)) => ServerError::Upstream(e.to_string()),
        }
    }
}

/// Result type for server operations.
pub type Result<T> = std::result::Result<T, ServerError>;

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

/// Body of a 504, in the same shape as an unsuccessful outcome.
#[derive(Debug, Serialize)]
pub struct TimeoutResponse {
    pub success: bool,
    pub error: String,
    pub message: String,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ServerError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ServerError::PayloadTooLarge(_) => (StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large"),
            ServerError::ExecutionTimeout(_) => (StatusCode::GATEWAY_TIMEOUT, "execution_timeout"),
            ServerError::Upstream(_) => (StatusCode::INTERNAL_SERVER_ERROR, "upstream_error"),
            ServerError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
            ServerError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
        };

        let message = self.to_string();

        if status.is_server_error() {
            tracing::error!(status = %status, code, error = %message, "Server error");
        } else {
            tracing::warn!(status = %status, code, error = %message, "Client error");
        }

        if let ServerError::ExecutionTimeout(message) = self {
            let body = TimeoutResponse {
                success: false,
                error: EXECUTION_TIMEOUT.to_string(),
                message,
            };
            return (status, Json(body)).into_response();
        }

        let body = ErrorResponse {
            code: code.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}
