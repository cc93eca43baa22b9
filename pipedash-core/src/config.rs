//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/pipedash/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/pipedash/` (~/.config/pipedash/)
//! - Cache: `$XDG_CACHE_HOME/pipedash/` (~/.cache/pipedash/, chart images)
//! - State/Logs: `$XDG_STATE_HOME/pipedash/` (~/.local/state/pipedash/)

use crate::error::{Error, Result};
use crate::schema::ColumnStrategy;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_CACHE_HOME or ~/.cache
fn xdg_cache_home() -> PathBuf {
    std::env::var("XDG_CACHE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".cache"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    /// Backend connection settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Rendering choices for dynamic tables
    #[serde(default)]
    pub view: ViewConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Backend connection settings
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Origin of the dashboard API (e.g., `http://localhost:8001`)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// HTTP request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
        }
    }
}

impl ServerConfig {
    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        let url = self.base_url.trim();
        if url.is_empty() {
            return Err(Error::Config("server.base_url must not be empty".to_string()));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(Error::Config(format!(
                "server.base_url must start with http:// or https:// (got {:?})",
                url
            )));
        }
        if self.timeout_secs == 0 {
            return Err(Error::Config(
                "server.timeout_secs must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Base URL without a trailing slash
    pub fn normalized_base_url(&self) -> String {
        self.base_url.trim().trim_end_matches('/').to_string()
    }
}

fn default_base_url() -> String {
    "http://localhost:8001".to_string()
}

fn default_timeout() -> u64 {
    30
}

/// Rendering choices for dynamic tables
#[derive(Debug, Deserialize, Clone, Default)]
pub struct ViewConfig {
    /// How report and CSV columns are derived from rows
    #[serde(default)]
    pub column_strategy: ColumnStrategy,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        config.server.validate()?;
        Ok(config)
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/pipedash/config.toml` (~/.config/pipedash/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("pipedash").join("config.toml")
    }

    /// Returns the cache directory path
    ///
    /// `$XDG_CACHE_HOME/pipedash/` (~/.cache/pipedash/)
    pub fn cache_dir() -> PathBuf {
        xdg_cache_home().join("pipedash")
    }

    /// Returns the directory holding session-scoped chart images
    pub fn chart_dir() -> PathBuf {
        Self::cache_dir().join("charts")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/pipedash/` (~/.local/state/pipedash/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("pipedash")
    }

    /// Returns the log file path
    ///
    /// `$XDG_STATE_HOME/pipedash/pipedash.log` (~/.local/state/pipedash/pipedash.log)
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("pipedash.log")
    }
}
