//! Error types for the executor crate.

use thiserror::Error;

/// Result type alias using the executor error type.
pub type Result<T> = std::result::Result<T, ExecutorError>;

// ─────────────────────────────────────────────────────────────────────────────
// Submission Errors
// ─────────────────────────────────────────────────────────────────────────────

/// A submission rejected before it reaches the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    /// The combined size of all source files exceeds the limit.
    #[error("Code too large: {size} bytes exceeds the {limit} byte limit")]
    TooLarge {
        /// Combined byte length of all file contents.
        size: usize,
        /// Configured limit in bytes.
        limit: usize,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// Executor Errors
// ─────────────────────────────────────────────────────────────────────────────

/// Errors from talking to the remote execution service.
///
/// Remote 4xx/5xx answers to `execute` are *not* errors: they are returned
/// as data so the classifier sees them. Only failures without a usable
/// response end up here.
#[derive(Debug, Clone, Error)]
pub enum ExecutorError {
    /// The request did not complete within the client timeout.
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Network/connectivity error.
    #[error("Network error: {0}")]
    Network(String),

    /// The remote service answered with a non-success status where no
    /// structured result was expected.
    #[error("Remote error ({status}): {message}")]
    Remote {
        /// HTTP status code.
        status: u16,
        /// Response body or reason.
        message: String,
    },

    /// Response body could not be decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Backend misconfiguration (bad URL, client build failure).
    #[error("Configuration error: {0}")]
    Config(String),

    /// The submission failed validation.
    #[error(transparent)]
    InvalidSubmission(#[from] SubmissionError),
}

impl ExecutorError {
    /// Returns true if the local request budget ran out.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// Returns true if this error was caused by the caller's input.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidSubmission(_))
    }
}

impl From<reqwest::Error> for ExecutorError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ExecutorError::Timeout(err.to_string())
        } else if err.is_connect() {
            ExecutorError::Network(format!("Connection failed: {}", err))
        } else if err.is_decode() {
            ExecutorError::Serialization(err.to_string())
        } else {
            ExecutorError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ExecutorError {
    fn from(err: serde_json::Error) -> Self {
        ExecutorError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submission_error_messages() {
        let err = SubmissionError::TooLarge {
            size: 60_000,
            limit: 51_200,
        };
        assert!(err.to_string().starts_with("Code too large"));
    }

    #[test]
    fn test_error_predicates() {
        assert!(ExecutorError::Timeout("20s".to_string()).is_timeout());
        assert!(!ExecutorError::Network("refused".to_string()).is_timeout());

        let invalid: ExecutorError = SubmissionError::TooLarge { size: 2, limit: 1 }.into();
        assert!(invalid.is_client_error());
        assert!(!invalid.is_timeout());
    }

    #[test]
    fn test_invalid_submission_is_transparent() {
        let err: ExecutorError = SubmissionError::TooLarge { size: 2, limit: 1 }.into();
        assert_eq!(
            err.to_string(),
            "Code too large: 2 bytes exceeds the 1 byte limit"
        );
    }
}
