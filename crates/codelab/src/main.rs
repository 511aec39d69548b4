//! codelab - remote code execution proxy
//!
//! Main entry point for the codelab CLI.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use codelab_config::LoggingConfig;

mod commands;

use commands::{languages, run, start, status};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// codelab - run code remotely through a Piston execution service
#[derive(Parser)]
#[command(name = "codelab")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,

    /// Server URL (default: http://localhost:5000)
    #[arg(long, global = true, env = "CODELAB_SERVER_URL")]
    pub server: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the codelab server
    Start(start::StartArgs),

    /// Show server status
    Status(status::StatusArgs),

    /// List the languages the server can run
    Languages(languages::LanguagesArgs),

    /// Run source files through the server
    Run(run::RunArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let logging = codelab_config::load_config(None)
        .map(|loaded| loaded.config.logging_or_default())
        .unwrap_or_default();
    let _guard = init_tracing(&logging, cli.verbose);

    let server_url = cli
        .server
        .unwrap_or_else(|| "http://localhost:5000".to_string());

    let ctx = commands::Context {
        server_url,
        json_output: cli.json,
        verbose: cli.verbose,
    };

    match cli.command {
        Commands::Start(args) => start::run(args, &ctx).await,
        Commands::Status(args) => status::run(args, &ctx).await,
        Commands::Languages(args) => languages::run(args, &ctx).await,
        Commands::Run(args) => run::run(args, &ctx).await,
    }
}

/// Console (human-readable) + daily rolling JSON file.
///
/// The returned guard flushes the file writer on drop.
fn init_tracing(
    logging: &LoggingConfig,
    verbose: bool,
) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let console_filter = if verbose {
        EnvFilter::new("codelab=debug,codelab_server=debug,codelab_executor=debug,codelab_config=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "codelab={level},codelab_server={level},codelab_executor={level},warn",
                level = logging.level
            ))
        })
    };

    let (file_layer, guard) = if logging.file {
        let log_dir = logging.dir.clone().unwrap_or_else(default_log_dir);
        let file_appender = tracing_appender::rolling::daily(&log_dir, "codelab.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        let layer = tracing_subscriber::fmt::layer()
            .json()
            .with_writer(non_blocking)
            .with_filter(EnvFilter::new(
                "codelab=trace,codelab_server=trace,codelab_executor=trace,codelab_config=trace,info",
            ));
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .with_filter(console_filter),
        )
        .with(file_layer)
        .init();

    guard
}

fn default_log_dir() -> PathBuf {
    codelab_config::xdg_config_dir()
        .or_else(dirs::data_local_dir)
        .map(|d| d.join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"))
}
