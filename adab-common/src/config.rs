//! Configuration management for the Adab bot.
//!
//! The bot reads an optional configuration file at `~/.adab-bot/config.json`.
//!
//! # Configuration Priority
//!
//! 1. Environment variables (a `.env` file in the working directory is loaded first)
//! 2. Explicit config file values
//! 3. Default values
//!
//! # Environment Variable Mapping
//!
//! - `TELEGRAM_BOT_TOKEN` → telegram.bot_token
//! - `ADAB_POLL_TIMEOUT_SECS` → telegram.poll_timeout_secs
//! - `ADAB_LOG_LEVEL` → observability.log_level
//! - `ADAB_LOG_FORMAT` → observability.log_format

use crate::error::{Error, Result, ResultExt};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Token used when no bot token is configured.
///
/// Startup does not reject it; the Bot API refuses it when the transport connects.
pub const TOKEN_SENTINEL: &str = "none";

/// Get the configuration directory path.
pub fn config_dir() -> PathBuf {
    directories::UserDirs::new().map_or_else(
        || PathBuf::from(".adab-bot"),
        |dirs| dirs.home_dir().join(".adab-bot"),
    )
}

/// Get the configuration file path.
pub fn config_path() -> PathBuf {
    config_dir().join("config.json")
}

// ============================================================================
// Telegram
// ============================================================================

/// Telegram Bot API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot authentication token
    #[serde(default = "default_bot_token")]
    pub bot_token: String,

    /// Long-poll timeout passed to `getUpdates`
    #[serde(default = "default_poll_timeout_secs")]
    pub poll_timeout_secs: u64,

    /// Bot API base URL (overridable for tests and self-hosted API servers)
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: default_bot_token(),
            poll_timeout_secs: default_poll_timeout_secs(),
            api_base: default_api_base(),
        }
    }
}

impl TelegramConfig {
    /// Whether a real (non-sentinel, non-empty) token has been supplied.
    pub fn has_token(&self) -> bool {
        !self.bot_token.is_empty() && self.bot_token != TOKEN_SENTINEL
    }
}

fn default_bot_token() -> String {
    TOKEN_SENTINEL.into()
}

fn default_poll_timeout_secs() -> u64 {
    30
}

fn default_api_base() -> String {
    "https://api.telegram.org".into()
}

// ============================================================================
// Observability
// ============================================================================

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level", alias = "level")]
    pub log_level: String,

    /// Log format (json, pretty)
    #[serde(default = "default_log_format", alias = "format")]
    pub log_format: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".into()
}

fn default_log_format() -> String {
    "pretty".into()
}

// ============================================================================
// Root
// ============================================================================

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Telegram transport settings
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load configuration from the default path.
    pub fn load() -> Result<Self> {
        let path = config_path();
        if !path.exists() {
            tracing::debug!("Config file not found, using defaults");
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .context(format!("Failed to read config from {}", path.display()))?;

        serde_json::from_str(&content)
            .context(format!("Failed to parse config from {}", path.display()))
    }

    /// Load configuration with `.env` and environment variable overrides.
    ///
    /// When `path` is given the file must exist; otherwise the default path is optional.
    pub fn load_with_env(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::load_from(p)?,
            None => Self::load()?,
        };

        // A missing .env file is the normal case.
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                return Err(Error::Config(format!("Failed to load .env: {e}")));
            }
        }

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides to the configuration.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup("TELEGRAM_BOT_TOKEN") {
            self.telegram.bot_token = token;
        }
        if let Some(timeout) = lookup("ADAB_POLL_TIMEOUT_SECS") {
            match timeout.parse() {
                Ok(t) => self.telegram.poll_timeout_secs = t,
                Err(_) => tracing::warn!(value = %timeout, "Ignoring invalid ADAB_POLL_TIMEOUT_SECS"),
            }
        }
        if let Some(level) = lookup("ADAB_LOG_LEVEL") {
            self.observability.log_level = level;
        }
        if let Some(format) = lookup("ADAB_LOG_FORMAT") {
            self.observability.log_format = format;
        }
    }
}
