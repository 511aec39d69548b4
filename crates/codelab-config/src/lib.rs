//! Configuration for codelab.
//!
//! TOML configuration with three sections:
//! - `[server]`: listener, auth token, rate limits, CORS, body limit
//! - `[executor]`: execution service URL, timeouts, runtime cache
//! - `[logging]`: level and log file directory
//!
//! Files are layered (user config dir, then project-local `codelab.toml`),
//! then environment overrides are applied. CLI flags are handled by the
//! binary on top of the result.

pub mod discovery;
pub mod error;
pub mod types;

pub use discovery::{
    ConfigSource, LoadedConfig, load_config, load_config_file, load_config_with_options,
    load_explicit_config, save_config, xdg_config_dir, xdg_config_path,
};
pub use error::{ConfigError, Result};
pub use types::*;
