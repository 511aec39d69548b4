//! Config file discovery and layered merging.
//!
//! Resolution order (later overrides earlier):
//! 1. `<config dir>/codelab/config.toml` (user config)
//! 2. `./codelab.toml` (project-local)
//! 3. Environment: `PISTON_API_URL`, `CODELAB_API_TOKEN`, `PORT`
//! 4. CLI arguments (handled externally)

use std::path::{Path, PathBuf};

use crate::{CodelabConfig, ConfigError, Result};

/// Default config filename for project-local config.
const PROJECT_CONFIG_FILE: &str = "codelab.toml";

/// Default config filename within the user config directory.
const USER_CONFIG_FILE: &str = "config.toml";

/// Application name for config directory resolution.
const APP_NAME: &str = "codelab";

/// Environment variable to override the config directory.
const CONFIG_DIR_ENV: &str = "CODELAB_CONFIG_DIR";

/// Environment variable overriding `executor.piston_url`.
pub const PISTON_URL_ENV: &str = "PISTON_API_URL";

/// Environment variable overriding `server.api_token`.
pub const API_TOKEN_ENV: &str = "CODELAB_API_TOKEN";

/// Environment variable overriding `server.port`.
pub const PORT_ENV: &str = "PORT";

/// Tracks where each config layer was loaded from.
#[derive(Debug, Clone)]
pub struct ConfigSource {
    /// Path to the config file.
    pub path: PathBuf,
    /// Whether the file was found and loaded.
    pub loaded: bool,
}

/// Result of config discovery and loading.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// The merged configuration.
    pub config: CodelabConfig,
    /// Sources that were checked, in order of precedence (lowest first).
    pub sources: Vec<ConfigSource>,
    /// Primary source file (first successfully loaded), for save operations.
    pub source: Option<ConfigSource>,
    /// Environment variables that overrode file values.
    pub env_overrides: Vec<&'static str>,
    /// Warnings generated during loading (unparseable layers, plaintext tokens).
    pub warnings: Vec<String>,
}

impl LoadedConfig {
    /// Get paths of sources that were actually loaded.
    pub fn loaded_from(&self) -> Vec<&Path> {
        self.sources
            .iter()
            .filter(|s| s.loaded)
            .map(|s| s.path.as_path())
            .collect()
    }
}

/// Load configuration by discovering and merging all config layers.
pub fn load_config(project_dir: Option<&Path>) -> Result<LoadedConfig> {
    load_config_with_options(project_dir, None)
}

/// Load configuration with explicit control over the user config directory.
///
/// `config_dir` overrides both `CODELAB_CONFIG_DIR` and the platform default.
pub fn load_config_with_options(
    project_dir: Option<&Path>,
    config_dir: Option<&Path>,
) -> Result<LoadedConfig> {
    load_with_env(project_dir, config_dir, |key| std::env::var(key).ok())
}

/// Layer files, then apply overrides read through `env`.
fn load_with_env(
    project_dir: Option<&Path>,
    config_dir: Option<&Path>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<LoadedConfig> {
    let mut config = CodelabConfig::new();
    let mut sources = Vec::new();
    let mut warnings = Vec::new();

    // 1. User config: explicit override, then env var, then platform default
    let user_config_path = match config_dir {
        Some(dir) => Some(dir.join(USER_CONFIG_FILE)),
        None => xdg_config_path(),
    };
    if let Some(path) = user_config_path {
        let source = load_layer(&mut config, &path, &mut warnings)?;
        sources.push(source);
    }

    // 2. Project-local config
    let project_path = project_dir
        .map(|d| d.join(PROJECT_CONFIG_FILE))
        .unwrap_or_else(|| PathBuf::from(PROJECT_CONFIG_FILE));
    let source = load_layer(&mut config, &project_path, &mut warnings)?;
    sources.push(source);

    check_plaintext_token(&config, &mut warnings);

    // 3. Environment
    let env_overrides = apply_env_overrides(&mut config, env, &mut warnings);

    let source = sources.iter().find(|s| s.loaded).cloned();

    Ok(LoadedConfig {
        config,
        sources,
        source,
        env_overrides,
        warnings,
    })
}

/// Load an explicitly named config file in place of discovery.
///
/// The file must exist and parse. Environment overrides still apply on top.
pub fn load_explicit_config(path: &Path) -> Result<LoadedConfig> {
    load_explicit_with_env(path, |key| std::env::var(key).ok())
}

fn load_explicit_with_env(
    path: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> Result<LoadedConfig> {
    let mut config = load_config_file(path)?;
    let mut warnings = Vec::new();
    check_plaintext_token(&config, &mut warnings);

    let env_overrides = apply_env_overrides(&mut config, env, &mut warnings);

    let source = ConfigSource {
        path: path.to_path_buf(),
        loaded: true,
    };
    Ok(LoadedConfig {
        config,
        sources: vec![source.clone()],
        source: Some(source),
        env_overrides,
        warnings,
    })
}

/// Load config from a specific file path (no discovery).
pub fn load_config_file(path: &Path) -> Result<CodelabConfig> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.display().to_string(),
        source: e,
    })?;
    CodelabConfig::from_toml(&contents)
}

/// Save configuration to a file.
///
/// Creates parent directories if they don't exist.
pub fn save_config(config: &CodelabConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::WriteFile {
            path: parent.display().to_string(),
            source: e,
        })?;
    }

    let contents = config.to_toml()?;
    std::fs::write(path, contents).map_err(|e| ConfigError::WriteFile {
        path: path.display().to_string(),
        source: e,
    })?;

    Ok(())
}

/// Get the user config file path for codelab.
pub fn xdg_config_path() -> Option<PathBuf> {
    xdg_config_dir().map(|d| d.join(USER_CONFIG_FILE))
}

/// Get the user config directory for codelab.
///
/// Checks `CODELAB_CONFIG_DIR` first, then falls back to the platform default
/// (`~/.config/codelab` on Linux, `~/Library/Application Support/codelab` on macOS).
pub fn xdg_config_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var(CONFIG_DIR_ENV)
        && !dir.is_empty()
    {
        return Some(PathBuf::from(dir));
    }
    dirs::config_dir().map(|d| d.join(APP_NAME))
}

/// Try to load a config file and merge it into the existing config.
fn load_layer(
    config: &mut CodelabConfig,
    path: &Path,
    warnings: &mut Vec<String>,
) -> Result<ConfigSource> {
    if !path.is_file() {
        return Ok(ConfigSource {
            path: path.to_path_buf(),
            loaded: false,
        });
    }

    match load_config_file(path) {
        Ok(layer) => {
            config.merge(layer);
            Ok(ConfigSource {
                path: path.to_path_buf(),
                loaded: true,
            })
        }
        Err(e) => {
            warnings.push(format!("Failed to load {}: {}", path.display(), e));
            Ok(ConfigSource {
                path: path.to_path_buf(),
                loaded: false,
            })
        }
    }
}

/// Warn when the API token is stored in a config file.
fn check_plaintext_token(config: &CodelabConfig, warnings: &mut Vec<String>) {
    if config
        .server
        .as_ref()
        .is_some_and(|s| s.api_token.is_some())
    {
        warnings.push(format!(
            "[server] config contains a plaintext api_token. \
             Consider setting {} instead.",
            API_TOKEN_ENV
        ));
    }
}

/// Apply environment overrides, returning the variables that took effect.
fn apply_env_overrides(
    config: &mut CodelabConfig,
    env: impl Fn(&str) -> Option<String>,
    warnings: &mut Vec<String>,
) -> Vec<&'static str> {
    let mut applied = Vec::new();
    let lookup = |key: &str| env(key).filter(|v| !v.trim().is_empty());

    if let Some(url) = lookup(PISTON_URL_ENV) {
        config
            .executor
            .get_or_insert_with(Default::default)
            .piston_url = url.trim().to_string();
        applied.push(PISTON_URL_ENV);
    }

    if let Some(token) = lookup(API_TOKEN_ENV) {
        config
            .server
            .get_or_insert_with(Default::default)
            .api_token = Some(token);
        applied.push(API_TOKEN_ENV);
    }

    if let Some(port) = lookup(PORT_ENV) {
        match port.trim().parse::<u16>() {
            Ok(port) => {
                config.server.get_or_insert_with(Default::default).port = port;
                applied.push(PORT_ENV);
            }
            Err(_) => warnings.push(format!("Ignoring {}={}: not a port number", PORT_ENV, port)),
        }
    }

    applied
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
