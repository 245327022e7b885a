//! Runtime configuration.
//!
//! Values are layered, highest priority first: command-line overrides, the
//! environment (a `.env` file is loaded by the binary), the TOML file at
//! `~/.config/vidcoach/config.toml`, then built-in defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use thiserror::Error;

use crate::analyze::PollConfig;
use crate::gemini::DEFAULT_BASE_URL;

/// Model used when nothing else is configured.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Environment variables checked for the API key, in order.
pub const API_KEY_VARS: [&str; 3] = ["GOOGLE_GEMINI_API_KEY", "GEMINI_API_KEY", "GOOGLE_API_KEY"];

pub const MODEL_VAR: &str = "VIDCOACH_MODEL";
pub const BASE_URL_VAR: &str = "VIDCOACH_BASE_URL";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(
        "No API key found. Set one of {} in the environment or a .env file, \
         add api_key to the config file, or pass --api-key",
        API_KEY_VARS.join(", ")
    )]
    MissingApiKey,

    #[error("Input file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Contents of `config.toml`. Every key is optional.
#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub poll_interval_secs: Option<u64>,
    pub max_wait_secs: Option<u64>,
    pub output_dir: Option<PathBuf>,
}

impl ConfigFile {
    /// Read `path`; a missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;

        toml::from_str(&content).with_context(|| format!("invalid TOML in {}", path.display()))
    }
}

/// Values given on the command line
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub poll_interval_secs: Option<u64>,
    pub max_wait_secs: Option<u64>,
    pub output_dir: Option<PathBuf>,
}

/// Resolved configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub poll: PollConfig,
    pub output_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            poll: PollConfig::default(),
            output_dir: None,
        }
    }
}

impl Config {
    /// Load from `config_path` (or the default location) and the process
    /// environment, then apply `overrides`.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file is unreadable or invalid, or if a
    /// resulting value is out of range.
    pub fn load(config_path: Option<&Path>, overrides: Overrides) -> Result<Self> {
        let path = config_path.map_or_else(default_config_path, Path::to_path_buf);
        let file = ConfigFile::load(&path)?;
        tracing::debug!(path = %path.display(), "Loaded configuration");

        Ok(Self::from_layers(
            file,
            |key| std::env::var(key).ok(),
            overrides,
        )?)
    }

    /// Merge the layers. `env` looks up one variable; empty values count as unset.
    pub fn from_layers<F>(file: ConfigFile, env: F, overrides: Overrides) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = |key: &str| env(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let api_key = overrides
            .api_key
            .filter(|k| !k.trim().is_empty())
            .or_else(|| API_KEY_VARS.iter().find_map(|&var| env(var)))
            .or(file.api_key.filter(|k| !k.trim().is_empty()));

        let model = overrides
            .model
            .or_else(|| env(MODEL_VAR))
            .or(file.model)
            .unwrap_or(defaults.model);

        let base_url = env(BASE_URL_VAR)
            .or(file.base_url)
            .unwrap_or(defaults.base_url);

        let interval = overrides
            .poll_interval_secs
            .or(file.poll_interval_secs)
            .map_or(defaults.poll.interval, Duration::from_secs);
        let max_wait = overrides
            .max_wait_secs
            .or(file.max_wait_secs)
            .map_or(defaults.poll.max_wait, Duration::from_secs);

        if interval.is_zero() {
            return Err(ConfigError::Invalid(
                "poll interval must be at least 1 second".to_string(),
            ));
        }

        Ok(Self {
            api_key,
            model,
            base_url,
            poll: PollConfig { interval, max_wait },
            output_dir: overrides.output_dir.or(file.output_dir),
        })
    }

    /// The API key, or an error naming where to put one
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.api_key.as_deref().ok_or(ConfigError::MissingApiKey)
    }
}

/// `~/.config/vidcoach/config.toml`
#[must_use]
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("vidcoach")
        .join("config.toml")
}
