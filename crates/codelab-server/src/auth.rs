//! Authentication middleware.
//!
//! Callers present `Authorization: Bearer <token>`; the token is compared in
//! constant time against the configured API token. Token issuance happens
//! elsewhere.

use axum::{
    body::Body,
    extract::{Request, State},
    http::{StatusCode, header::AUTHORIZATION},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use crate::state::AppState;

// ─────────────────────────────────────────────────────────────────────────────
// Identity
// ─────────────────────────────────────────────────────────────────────────────

/// Authenticated identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Identity {
    /// Authenticated via bearer token.
    Token,
    /// No token configured; every caller is let through.
    Local,
}

impl Identity {
    /// Check if this is a token identity.
    pub fn is_token(&self) -> bool {
        matches!(self, Identity::Token)
    }

    /// Check if auth was skipped.
    pub fn is_local(&self) -> bool {
        matches!(self, Identity::Local)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Auth Error
// ─────────────────────────────────────────────────────────────────────────────

/// Authentication error.
#[derive(Debug, Clone)]
pub enum AuthError {
    /// Missing authorization header.
    MissingToken,
    /// Invalid token format.
    InvalidFormat,
    /// Token validation failed.
    InvalidToken,
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingToken => write!(f, "Missing authorization token"),
            AuthError::InvalidFormat => write!(f, "Invalid authorization format"),
            AuthError::InvalidToken => write!(f, "Invalid token"),
        }
    }
}

impl std::error::Error for AuthError {}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match self {
            AuthError::MissingToken | AuthError::InvalidToken => StatusCode::UNAUTHORIZED,
            AuthError::InvalidFormat => StatusCode::BAD_REQUEST,
        };

        tracing::warn!(status = status.as_u16(), reason = %self, "Rejected request");

        let body = serde_json::json!({
            "error": self.to_string(),
            "code": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Security Helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Compare two strings in constant time.
///
/// Lengths are not hidden: a length mismatch returns early after a dummy
/// comparison of the same size as a real one.
fn constant_time_eq(a: &str, b: &str) -> bool {
    let a_bytes = a.as_bytes();
    let b_bytes = b.as_bytes();

    if a_bytes.len() == b_bytes.len() {
        a_bytes.ct_eq(b_bytes).into()
    } else {
        let _ = a_bytes.ct_eq(a_bytes);
        false
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Middleware
// ─────────────────────────────────────────────────────────────────────────────

/// Authentication middleware function.
///
/// Validates the request and injects the `Identity` into request extensions.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let identity = validate_request(&request, &state)?;

    request.extensions_mut().insert(identity);

    Ok(next.run(request).await)
}

/// Validate a request and return the identity.
fn validate_request(request: &Request<Body>, state: &AppState) -> Result<Identity, AuthError> {
    let Some(ref expected_token) = state.config().auth_token else {
        return Ok(Identity::Local);
    };

    let Some(auth_header) = request.headers().get(AUTHORIZATION) else {
        return Err(AuthError::MissingToken);
    };

    let auth_str = auth_header.to_str().map_err(|_| AuthError::InvalidFormat)?;
    let Some(token) = auth_str.strip_prefix("Bearer ") else {
        return Err(AuthError::InvalidFormat);
    };

    if constant_time_eq(token.trim(), expected_token) {
        Ok(Identity::Token)
    } else {
        Err(AuthError::InvalidToken)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
