//! CLI command handlers.

pub mod languages;
pub mod run;
pub mod start;
pub mod status;

use anyhow::Result;
use codelab_client::CodelabClient;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Server URL to connect to.
    pub server_url: String,
    /// Output as JSON for scripting.
    pub json_output: bool,
    /// Verbose output enabled.
    pub verbose: bool,
}

impl Context {
    /// An API client for the configured server.
    pub fn client(&self, token: Option<&str>) -> Result<CodelabClient> {
        let mut builder = CodelabClient::builder().base_url(&self.server_url);
        if let Some(token) = token {
            builder = builder.auth_token(token);
        }
        Ok(builder.build()?)
    }
}
