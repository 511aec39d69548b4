//! Server configuration.

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use codelab_executor::DEFAULT_EXECUTE_TIMEOUT;

/// Default port (the one the course frontend proxies to).
pub const DEFAULT_PORT: u16 = 5000;

/// Default max body size for REST requests (100 KiB).
pub const DEFAULT_MAX_BODY_SIZE: usize = 100 * 1024;

/// Default global requests per minute across all routes.
pub const DEFAULT_API_RPM: u32 = 120;

/// Default execute requests allowed per caller per window.
pub const DEFAULT_EXECUTE_MAX_REQUESTS: u32 = 10;

/// Default execute rate limit window.
pub const DEFAULT_EXECUTE_WINDOW: Duration = Duration::from_secs(60);

/// Default budget for a whole execute dispatch: the backend timeout plus 5s.
pub const DEFAULT_EXECUTION_TIMEOUT: Duration =
    Duration::from_secs(DEFAULT_EXECUTE_TIMEOUT.as_secs() + 5);

/// Default CORS origin (the frontend dev server).
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:5173";

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the server to.
    pub bind_address: SocketAddr,

    /// API token for `/api/code/execute`. `None` disables auth (local development).
    pub auth_token: Option<String>,

    /// Enable rate limiting.
    pub rate_limiting: bool,

    /// Rate limit: requests per minute across all routes.
    pub api_rpm: u32,

    /// Rate limit: execute requests allowed per caller per window.
    pub execute_max_requests: u32,

    /// Rate limit: window for `execute_max_requests`.
    pub execute_window: Duration,

    /// Key the execute limiter on the first `X-Forwarded-For` hop instead of
    /// the socket peer. Only enable behind a proxy that overwrites the header.
    pub trust_forwarded_for: bool,

    /// Enable request logging.
    pub request_logging: bool,

    /// CORS allowed origins (empty = no CORS).
    pub cors_origins: Vec<String>,

    /// Maximum REST request body size in bytes.
    pub max_body_size: usize,

    /// Local budget for one execute dispatch. Expiry answers 504.
    pub execution_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_PORT)),
            auth_token: None,
            rate_limiting: true,
            api_rpm: DEFAULT_API_RPM,
            execute_max_requests: DEFAULT_EXECUTE_MAX_REQUESTS,
            execute_window: DEFAULT_EXECUTE_WINDOW,
            trust_forwarded_for: false,
            request_logging: true,
            cors_origins: vec![DEFAULT_CORS_ORIGIN.to_string()],
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            execution_timeout: DEFAULT_EXECUTION_TIMEOUT,
        }
    }
}

impl ServerConfig {
    /// Create a new server config with an optional auth token.
    /// Pass `None` to disable authentication (local development).
    pub fn new(auth_token: Option<String>) -> Self {
        Self {
            auth_token,
            ..Default::default()
        }
    }

    /// Set the bind address.
    pub fn with_bind_address(mut self, addr: SocketAddr) -> Self {
        self.bind_address = addr;
        self
    }

    /// Enable or disable rate limiting.
    pub fn with_rate_limiting(mut self, enabled: bool) -> Self {
        self.rate_limiting = enabled;
        self
    }

    /// Set the global rate limit (requests per minute).
    pub fn with_api_rpm(mut self, rpm: u32) -> Self {
        self.api_rpm = rpm;
        self
    }

    /// Set the per-caller execute quota.
    pub fn with_execute_limit(mut self, max_requests: u32, window: Duration) -> Self {
        self.execute_max_requests = max_requests;
        self.execute_window = window;
        self
    }

    /// Trust `X-Forwarded-For` when identifying callers.
    pub fn with_trust_forwarded_for(mut self, trust: bool) -> Self {
        self.trust_forwarded_for = trust;
        self
    }

    /// Enable or disable request logging.
    pub fn with_request_logging(mut self, enabled: bool) -> Self {
        self.request_logging = enabled;
        self
    }

    /// Set CORS allowed origins.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = origins;
        self
    }

    /// Set the maximum REST request body size.
    pub fn with_max_body_size(mut self, size: usize) -> Self {
        self.max_body_size = size;
        self
    }

    /// Set the local execute budget.
    pub fn with_execution_timeout(mut self, timeout: Duration) -> Self {
        self.execution_timeout = timeout;
        self
    }
}
