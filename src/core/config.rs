//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.koko/config.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.

use log::{LevelFilter, debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct KokoConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct GeneralConfig {
    pub log_level: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ServerConfig {
    pub api_base: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct UiConfig {
    pub suggestions: Option<Vec<String>>,
    pub narrow_width: Option<u16>,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_API_BASE: &str = "http://localhost:5000";
pub const DEFAULT_NARROW_WIDTH: u16 = 80;
pub const API_BASE_ENV: &str = "KOKO_API_BASE";

const DEFAULT_SUGGESTIONS: [&str; 4] = ["Summarize", "Key numbers", "Next steps", "Risks"];

pub fn default_suggestions() -> Vec<String> {
    DEFAULT_SUGGESTIONS.iter().map(|s| s.to_string()).collect()
}

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub api_base: String,
    pub log_level: LevelFilter,
    pub suggestions: Vec<String>,
    /// Below this many columns the sidebar is hidden.
    pub narrow_width: u16,
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Loading
// ============================================================================

/// Returns the path to `~/.koko/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".koko").join("config.toml"))
}

/// Load config from `~/.koko/config.toml`.
///
/// If the file doesn't exist, generates a commented-out default and
/// returns `KokoConfig::default()`. If it exists but is malformed,
/// returns `ConfigError::Parse`.
pub fn load_config() -> Result<KokoConfig, ConfigError> {
    let path = match config_path() {
        Some(p) => p,
        None => {
            warn!("Could not determine home directory, using default config");
            return Ok(KokoConfig::default());
        }
    };
    load_config_from(&path)
}

pub fn load_config_from(path: &Path) -> Result<KokoConfig, ConfigError> {
    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(path);
        return Ok(KokoConfig::default());
    }

    let contents = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: KokoConfig = toml::from_str(&contents).map_err(ConfigError::Parse)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

const DEFAULT_CONFIG_CONTENT: &str = r#"# Koko Configuration
# All settings are optional. Defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [general]
# log_level = "debug"                # "off", "error", "warn", "info", "debug", "trace"

# [server]
# api_base = "http://localhost:5000" # Or set KOKO_API_BASE, or pass --api-base

# [ui]
# suggestions = ["Summarize", "Key numbers", "Next steps", "Risks"]
# narrow_width = 80                  # Hide the sidebar below this many columns
"#;

/// Generates a commented-out default config file at the given path.
fn generate_default_config(path: &Path) {
    if let Some(parent) = path.parent()
        && let Err(e) = fs::create_dir_all(parent)
    {
        warn!("Failed to create config directory: {}", e);
        return;
    }
    if let Err(e) = fs::write(path, DEFAULT_CONFIG_CONTENT) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Trims a base URL and drops trailing slashes. Blank input yields `None`.
pub fn normalize_api_base(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn parse_log_level(raw: &str) -> Option<LevelFilter> {
    match LevelFilter::from_str(raw.trim()) {
        Ok(level) => Some(level),
        Err(_) => {
            warn!("Ignoring unknown log level '{}'", raw);
            None
        }
    }
}

/// Resolve the final config by collapsing: defaults → config file → env vars → CLI.
///
/// `cli_api_base` and `cli_log_level` are from CLI flags (None = not specified).
pub fn resolve(
    config: &KokoConfig,
    cli_api_base: Option<&str>,
    cli_log_level: Option<&str>,
) -> ResolvedConfig {
    let env_api_base = std::env::var(API_BASE_ENV).ok();
    resolve_with_env(config, cli_api_base, cli_log_level, env_api_base.as_deref())
}

fn resolve_with_env(
    config: &KokoConfig,
    cli_api_base: Option<&str>,
    cli_log_level: Option<&str>,
    env_api_base: Option<&str>,
) -> ResolvedConfig {
    // API base: CLI → env → config → default, skipping blanks at every level
    let api_base = cli_api_base
        .and_then(normalize_api_base)
        .or_else(|| env_api_base.and_then(normalize_api_base))
        .or_else(|| config.server.api_base.as_deref().and_then(normalize_api_base))
        .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

    // Log level: CLI → config → default
    let log_level = cli_log_level
        .and_then(parse_log_level)
        .or_else(|| config.general.log_level.as_deref().and_then(parse_log_level))
        .unwrap_or(LevelFilter::Debug);

    let suggestions = match &config.ui.suggestions {
        Some(list) if !list.is_empty() => list.clone(),
        _ => default_suggestions(),
    };

    ResolvedConfig {
        api_base,
        log_level,
        suggestions,
        narrow_width: config.ui.narrow_width.unwrap_or(DEFAULT_NARROW_WIDTH),
    }
}
