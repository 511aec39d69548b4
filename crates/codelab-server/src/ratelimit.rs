//! Rate limiting and request logging middleware.
//!
//! Two limiters run in front of the API:
//! - a global limiter over every route (`api_rpm`)
//! - a per-caller limiter on `POST /api/code/execute`, keyed by the socket
//!   peer address, or by the first `X-Forwarded-For` hop when
//!   `trust_forwarded_for` is set
//!
//! Excess requests are rejected with 429 immediately; nothing is queued.

use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{
    DefaultKeyedRateLimiter, NotUntil, Quota, RateLimiter,
    clock::{Clock, DefaultClock},
    state::{InMemoryState, NotKeyed},
};
use serde::Serialize;

use crate::config::ServerConfig;
use crate::state::AppState;

// ─────────────────────────────────────────────────────────────────────────────
// Types
// ─────────────────────────────────────────────────────────────────────────────

/// Rate limiter type alias (uses default clock).
pub type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Per-caller rate limiter keyed by client address.
pub type SharedKeyedRateLimiter = Arc<DefaultKeyedRateLimiter<String>>;

/// Header carrying the original client address behind a proxy.
pub const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

/// Key used when the caller's address cannot be determined.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Tracked callers above which idle keys are pruned.
const PRUNE_THRESHOLD: usize = 10_000;

/// The limiters for one server instance.
pub struct RateLimits {
    /// Shared by every route.
    pub global: SharedRateLimiter,
    /// Per caller, execute only.
    pub execute: SharedKeyedRateLimiter,
}

impl RateLimits {
    /// Size the limiters from the server configuration.
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            global: create_rate_limiter(config.api_rpm),
            execute: create_keyed_limiter(config.execute_max_requests, config.execute_window),
        }
    }
}

/// Rate limit error response.
#[derive(Debug, Serialize)]
struct RateLimitError {
    error: String,
    code: u16,
    retry_after_seconds: Option<u64>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Rate Limiter Factory
// ─────────────────────────────────────────────────────────────────────────────

/// Create a rate limiter with the specified requests per minute.
pub fn create_rate_limiter(requests_per_minute: u32) -> SharedRateLimiter {
    let quota = Quota::per_minute(NonZeroU32::new(requests_per_minute).unwrap_or(NonZeroU32::MIN));
    Arc::new(RateLimiter::direct(quota))
}

/// Create a keyed limiter allowing `max_requests` per `window` for each key.
///
/// The full quota is available as an initial burst and replenishes evenly
/// over the window.
pub fn create_keyed_limiter(max_requests: u32, window: Duration) -> SharedKeyedRateLimiter {
    let burst = NonZeroU32::new(max_requests).unwrap_or(NonZeroU32::MIN);
    let quota = Quota::with_period(window / burst.get())
        .unwrap_or_else(|| Quota::per_second(burst))
        .allow_burst(burst);
    Arc::new(RateLimiter::keyed(quota))
}

/// Identify the caller for per-caller limiting.
///
/// `X-Forwarded-For` is client-controlled, so it is only consulted when
/// `trust_forwarded_for` is set.
pub fn client_key(request: &Request<Body>, trust_forwarded_for: bool) -> String {
    if trust_forwarded_for {
        let forwarded = request
            .headers()
            .get(FORWARDED_FOR_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());

        if let Some(hop) = forwarded {
            return hop.to_string();
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

fn retry_after_seconds(not_until: &NotUntil<<DefaultClock as Clock>::Instant>) -> u64 {
    let wait = not_until.wait_time_from(DefaultClock::default().now());
    let secs = wait.as_secs() + u64::from(wait.subsec_nanos() > 0);
    secs.max(1)
}

fn too_many_requests(retry_after: u64) -> Response {
    let error = RateLimitError {
        error: "Too many requests".to_string(),
        code: 429,
        retry_after_seconds: Some(retry_after),
    };

    (
        StatusCode::TOO_MANY_REQUESTS,
        [("Retry-After", retry_after.to_string())],
        axum::Json(error),
    )
        .into_response()
}

// ─────────────────────────────────────────────────────────────────────────────
// Middleware
// ─────────────────────────────────────────────────────────────────────────────

/// Global rate limiting middleware for all routes.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !state.config.rate_limiting {
        return next.run(request).await;
    }

    match state.limits.global.check() {
        Ok(_) => next.run(request).await,
        Err(not_until) => {
            let retry_after = retry_after_seconds(&not_until);

            tracing::warn!(
                path = %request.uri().path(),
                retry_after_seconds = retry_after,
                "Global rate limit exceeded"
            );

            too_many_requests(retry_after)
        }
    }
}

/// Per-caller rate limiting middleware for the execute route.
pub async fn execute_rate_limit_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !state.config.rate_limiting {
        return next.run(request).await;
    }

    let limiter = &state.limits.execute;
    let key = client_key(&request, state.config.trust_forwarded_for);

    if limiter.len() > PRUNE_THRESHOLD {
        limiter.retain_recent();
    }

    match limiter.check_key(&key) {
        Ok(_) => next.run(request).await,
        Err(not_until) => {
            let retry_after = retry_after_seconds(&not_until);

            tracing::warn!(
                client = %key,
                path = %request.uri().path(),
                retry_after_seconds = retry_after,
                "Execute rate limit exceeded"
            );

            too_many_requests(retry_after)
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Request Logging
// ─────────────────────────────────────────────────────────────────────────────

/// Structured request logging middleware.
///
/// Logs method, path, status and duration; the level follows the status class.
pub async fn request_logging_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !state.config.request_logging {
        return next.run(request).await;
    }

    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let start = std::time::Instant::now();
    let response = next.run(request).await;
    let duration = start.elapsed();
    let status = response.status();

    if status.is_server_error() {
        tracing::error!(
            method = %method,
            path = %path,
            status = %status.as_u16(),
            duration_ms = %duration.as_millis(),
            "Request completed with server error"
        );
    } else if status.is_client_error() {
        tracing::warn!(
            method = %method,
            path = %path,
            status = %status.as_u16(),
            duration_ms = %duration.as_millis(),
            "Request completed with client error"
        );
    } else {
        tracing::info!(
            method = %method,
            path = %path,
            status = %status.as_u16(),
            duration_ms = %duration.as_millis(),
            "Request completed"
        );
    }

    response
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
