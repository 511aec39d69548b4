//! Application state shared across handlers.

use std::sync::Arc;

use codelab_executor::CodeRunner;

use crate::config::ServerConfig;
use crate::ratelimit::RateLimits;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Validates, dispatches and classifies submissions; owns the runtime cache.
    pub runner: Arc<CodeRunner>,

    /// Server configuration.
    pub config: Arc<ServerConfig>,

    /// Rate limiters, sized from the configuration.
    pub limits: Arc<RateLimits>,
}

impl AppState {
    /// Create a new application state.
    pub fn new(runner: CodeRunner, config: ServerConfig) -> Self {
        let limits = RateLimits::from_config(&config);
        Self {
            runner: Arc::new(runner),
            config: Arc::new(config),
            limits: Arc::new(limits),
        }
    }

    /// Server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}
