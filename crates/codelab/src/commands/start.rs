//! Start command - launches the codelab server.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use codelab_config::{CodelabConfig, ExecutorConfig};
use codelab_executor::{CodeRunner, PistonBackend, PistonConfig, RuntimeCache};
use codelab_server::{Server, ServerConfig};
use tracing::{debug, info};

use super::Context;

/// Arguments for the start command.
///
/// CLI arguments override config file values.
#[derive(Args, Debug)]
pub struct StartArgs {
    /// Port to listen on (overrides config)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Address to bind to (overrides config)
    #[arg(short, long)]
    pub bind: Option<String>,

    /// API token for authentication (or set CODELAB_API_TOKEN env var)
    #[arg(long, env = "CODELAB_API_TOKEN")]
    pub token: Option<String>,

    /// Piston API base URL (overrides config)
    #[arg(long)]
    pub piston_url: Option<String>,

    /// Disable rate limiting
    #[arg(long)]
    pub no_rate_limit: bool,

    /// Path to config file (overrides default discovery)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Run the start command.
pub async fn run(args: StartArgs, ctx: &Context) -> Result<()> {
    // ── Load configuration ──────────────────────────────────────────────

    let loaded = match &args.config {
        Some(config_path) => codelab_config::load_explicit_config(config_path)?,
        None => codelab_config::load_config(None)?,
    };

    for warning in &loaded.warnings {
        eprintln!("warning: {}", warning);
    }

    if ctx.verbose {
        let sources = loaded.loaded_from();
        if sources.is_empty() {
            println!("No config files found, using defaults + CLI args");
        } else {
            for source in sources {
                println!("Loaded config: {}", source.display());
            }
        }
        for var in &loaded.env_overrides {
            println!("Environment override: {}", var);
        }
    }

    debug!(sources = loaded.sources.len(), "configuration loaded");

    let mut config = loaded.config;
    apply_cli_overrides(&mut config, &args);

    // ── Build the execution stack ───────────────────────────────────────

    let executor = config.executor_or_default();
    let runner = build_runner(&executor)?;
    info!(
        piston_url = %executor.piston_url,
        cache_ttl_secs = executor.runtime_cache_ttl_secs,
        "execution backend ready"
    );

    if ctx.verbose {
        println!("Piston: {}", executor.piston_url);
    }

    // ── Serve ───────────────────────────────────────────────────────────

    let server_config = server_config(&config)?;
    println!("codelab listening on http://{}", server_config.bind_address);

    Server::new(runner, server_config).run().await?;
    Ok(())
}

/// Fold CLI flags into the loaded config.
fn apply_cli_overrides(config: &mut CodelabConfig, args: &StartArgs) {
    let mut server = config.server_or_default();
    if let Some(port) = args.port {
        server.port = port;
    }
    if let Some(bind) = &args.bind {
        server.bind = bind.clone();
    }
    if let Some(token) = &args.token {
        server.api_token = Some(token.clone());
    }
    if args.no_rate_limit {
        server.rate_limiting = false;
    }
    config.server = Some(server);

    if let Some(url) = &args.piston_url {
        let mut executor = config.executor_or_default();
        executor.piston_url = url.clone();
        config.executor = Some(executor);
    }
}

/// Piston backend, runtime cache and runner from the `[executor]` section.
fn build_runner(executor: &ExecutorConfig) -> Result<CodeRunner> {
    let piston = PistonConfig::new(executor.piston_url.clone())
        .with_runtimes_timeout(executor.runtimes_timeout())
        .with_execute_timeout(executor.execute_timeout());
    let backend = PistonBackend::new(piston)?;

    let cache = RuntimeCache::new(executor.runtime_cache_ttl())
        .with_stale_fallback(executor.serve_stale_on_error);

    Ok(CodeRunner::new(Arc::new(backend))
        .with_runtime_cache(cache)
        .with_max_source_bytes(executor.max_source_bytes))
}

/// HTTP server settings from the `[server]` section.
fn server_config(config: &CodelabConfig) -> Result<ServerConfig> {
    let server = config.server_or_default();
    let token = server.api_token.clone().filter(|t| !t.is_empty());

    Ok(ServerConfig::new(token)
        .with_bind_address(server.bind_address()?)
        .with_rate_limiting(server.rate_limiting)
        .with_api_rpm(server.api_rpm)
        .with_execute_limit(server.execute_max_requests, server.execute_window())
        .with_trust_forwarded_for(server.trust_forwarded_for)
        .with_request_logging(server.request_logging)
        .with_cors_origins(server.cors_origins.clone())
        .with_max_body_size(server.max_body_bytes)
        .with_execution_timeout(server.execution_timeout()))
}
