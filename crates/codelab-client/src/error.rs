//! Client error types.

use thiserror::Error;

/// Client error type.
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parsing failed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Server returned an error response.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error code from server.
        code: String,
        /// Error message from server.
        message: String,
        /// Seconds to wait before retrying, for 429 responses.
        retry_after: Option<u64>,
    },

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Check if this is an authentication error.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Error::Api { status: 401, .. })
    }

    /// Check if the request was rejected as malformed or oversized.
    pub fn is_bad_request(&self) -> bool {
        matches!(self, Error::Api { status: 400 | 413, .. })
    }

    /// Check if this is a rate limit error.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Error::Api { status: 429, .. })
    }

    /// Check if the execution ran out of time, on the server or locally.
    pub fn is_timeout(&self) -> bool {
        match self {
            Error::Api { status: 504, .. } => true,
            Error::Http(e) => e.is_timeout(),
            _ => false,
        }
    }

    /// Check if this is a server error.
    pub fn is_server_error(&self) -> bool {
        matches!(self, Error::Api { status, .. } if *status >= 500)
    }

    /// Suggested wait before retrying, when the server sent one.
    pub fn retry_after(&self) -> Option<u64> {
        match self {
            Error::Api { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error body from the server.
///
/// The server uses a few shapes: `{code, message}` for most errors,
/// `{error, code: 429, retry_after_seconds}` for rate limits, and
/// `{success: false, error, message}` for execution timeouts.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub(crate) struct ErrorResponse {
    pub code: Option<serde_json::Value>,
    pub message: Option<String>,
    pub error: Option<String>,
    pub retry_after_seconds: Option<u64>,
}

impl ErrorResponse {
    pub(crate) fn into_error(self, status: u16) -> Error {
        let code = match self.code {
            Some(serde_json::Value::String(code)) => code,
            Some(other) => other.to_string(),
            None => self
                .error
                .clone()
                .unwrap_or_else(|| "unknown".to_string()),
        };
        let message = self
            .message
            .or(self.error)
            .unwrap_or_else(|| format!("HTTP {}", status));

        Error::Api {
            status,
            code,
            message,
            retry_after: self.retry_after_seconds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(status: u16, body: &str) -> Error {
        serde_json::from_str::<ErrorResponse>(body)
            .unwrap()
            .into_error(status)
    }

    #[test]
    fn test_standard_error_body() {
        let err = parse(400, r#"{"code": "bad_request", "message": "Code too large"}"#);
        assert!(err.is_bad_request());
        assert!(err.to_string().contains("Code too large"));
    }

    #[test]
    fn test_rate_limit_body() {
        let err = parse(
            429,
            r#"{"error": "Too many requests", "code": 429, "retry_after_seconds": 6}"#,
        );
        assert!(err.is_rate_limited());
        assert_eq!(err.retry_after(), Some(6));
        match err {
            Error::Api { code, message, .. } => {
                assert_eq!(code, "429");
                assert_eq!(message, "Too many requests");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_timeout_body() {
        let err = parse(
            504,
            r#"{"success": false, "error": "Execution Timeout", "message": "exceeded 25 seconds"}"#,
        );
        assert!(err.is_timeout());
        assert!(err.is_server_error());
        match err {
            Error::Api { code, message, .. } => {
                assert_eq!(code, "Execution Timeout");
                assert_eq!(message, "exceeded 25 seconds");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_empty_body_falls_back_to_status() {
        let err = ErrorResponse::default().into_error(502);
        assert!(err.to_string().contains("HTTP 502"));
        assert!(!err.is_timeout());
    }
}
