//! Configuration types mapping to the TOML schema.
//!
//! ```toml
//! [server]
//! port = 5000
//! bind = "127.0.0.1"
//! cors_origins = ["http://localhost:5173"]
//!
//! [executor]
//! piston_url = "https://emkc.org/api/v2/piston"
//! execute_timeout_secs = 20
//!
//! [logging]
//! level = "info"
//! ```

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Default listen port.
pub const DEFAULT_PORT: u16 = 5000;
/// Default bind address.
pub const DEFAULT_BIND: &str = "127.0.0.1";
/// Default public Piston instance.
pub const DEFAULT_PISTON_URL: &str = "https://emkc.org/api/v2/piston";

// ─────────────────────────────────────────────────────────────────────────────
// Top-level Config
// ─────────────────────────────────────────────────────────────────────────────

/// Root configuration structure.
///
/// All sections are optional so that partial configs (e.g., project-local
/// overrides) can be loaded and merged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodelabConfig {
    /// HTTP server settings.
    pub server: Option<ServerConfig>,

    /// Execution service settings.
    pub executor: Option<ExecutorConfig>,

    /// Logging settings.
    pub logging: Option<LoggingConfig>,
}

impl CodelabConfig {
    /// Create an empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> crate::Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> crate::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Merge another config on top of this one (other takes priority).
    ///
    /// Sections are replaced whole, not merged field by field.
    pub fn merge(&mut self, other: CodelabConfig) {
        if other.server.is_some() {
            self.server = other.server;
        }

        if other.executor.is_some() {
            self.executor = other.executor;
        }

        if other.logging.is_some() {
            self.logging = other.logging;
        }
    }

    /// The `[server]` section, or defaults.
    pub fn server_or_default(&self) -> ServerConfig {
        self.server.clone().unwrap_or_default()
    }

    /// The `[executor]` section, or defaults.
    pub fn executor_or_default(&self) -> ExecutorConfig {
        self.executor.clone().unwrap_or_default()
    }

    /// The `[logging]` section, or defaults.
    pub fn logging_or_default(&self) -> LoggingConfig {
        self.logging.clone().unwrap_or_default()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Server Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Port to listen on.
    pub port: u16,
    /// Address to bind to.
    pub bind: String,
    /// Bearer token required for execute. Prefer `CODELAB_API_TOKEN`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
    /// Enable rate limiting.
    pub rate_limiting: bool,
    /// Global rate limit: requests per minute.
    pub api_rpm: u32,
    /// Execute requests allowed per caller per window.
    pub execute_max_requests: u32,
    /// Execute rate limit window, in seconds.
    pub execute_window_secs: u64,
    /// Identify callers by `X-Forwarded-For`. Only set behind a trusted proxy.
    pub trust_forwarded_for: bool,
    /// Enable request logging.
    pub request_logging: bool,
    /// CORS allowed origins.
    pub cors_origins: Vec<String>,
    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,
    /// Local budget for one execute dispatch, in seconds.
    pub execution_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind: DEFAULT_BIND.to_string(),
            api_token: None,
            rate_limiting: true,
            api_rpm: 120,
            execute_max_requests: 10,
            execute_window_secs: 60,
            trust_forwarded_for: false,
            request_logging: true,
            cors_origins: vec!["http://localhost:5173".to_string()],
            max_body_bytes: 100 * 1024,
            execution_timeout_secs: 25,
        }
    }
}

impl ServerConfig {
    /// The socket address from `bind` and `port`.
    pub fn bind_address(&self) -> crate::Result<SocketAddr> {
        let ip: IpAddr = self.bind.parse().map_err(|_| ConfigError::InvalidValue {
            field: "server.bind".to_string(),
            message: format!("'{}' is not an IP address", self.bind),
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }

    /// Execute rate limit window.
    pub fn execute_window(&self) -> Duration {
        Duration::from_secs(self.execute_window_secs)
    }

    /// Local execute budget.
    pub fn execution_timeout(&self) -> Duration {
        Duration::from_secs(self.execution_timeout_secs)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Executor Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Execution service configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Base URL of the Piston API.
    pub piston_url: String,
    /// Timeout for an execute call, in seconds.
    pub execute_timeout_secs: u64,
    /// Timeout for listing runtimes, in seconds.
    pub runtimes_timeout_secs: u64,
    /// How long a fetched runtime list stays valid, in seconds.
    pub runtime_cache_ttl_secs: u64,
    /// Serve the expired runtime list when a refresh fails.
    pub serve_stale_on_error: bool,
    /// Combined source size limit in bytes.
    pub max_source_bytes: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            piston_url: DEFAULT_PISTON_URL.to_string(),
            execute_timeout_secs: 20,
            runtimes_timeout_secs: 15,
            runtime_cache_ttl_secs: 24 * 60 * 60,
            serve_stale_on_error: false,
            max_source_bytes: 50 * 1024,
        }
    }
}

impl ExecutorConfig {
    /// Execute call timeout.
    pub fn execute_timeout(&self) -> Duration {
        Duration::from_secs(self.execute_timeout_secs)
    }

    /// Runtimes call timeout.
    pub fn runtimes_timeout(&self) -> Duration {
        Duration::from_secs(self.runtimes_timeout_secs)
    }

    /// Runtime cache TTL.
    pub fn runtime_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.runtime_cache_ttl_secs)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Logging Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Logging configuration section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: String,
    /// Whether to also write JSON logs to a daily rolling file.
    pub file: bool,
    /// Directory for log files. Defaults to the platform data dir.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: true,
            dir: None,
        }
    }
}
