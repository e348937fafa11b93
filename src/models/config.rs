//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Ranking source settings
    #[serde(default)]
    pub source: SourceConfig,

    /// Telegram delivery settings
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Sent-token cache settings
    #[serde(default)]
    pub cache: CacheConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.source.url.trim().is_empty() {
            return Err(AppError::validation("source.url is empty"));
        }
        url::Url::parse(&self.source.url)
            .map_err(|e| AppError::validation(format!("source.url is invalid: {e}")))?;
        if self.source.user_agent.trim().is_empty() {
            return Err(AppError::validation("source.user_agent is empty"));
        }
        if self.source.timeout_secs == 0 {
            return Err(AppError::validation("source.timeout_secs must be > 0"));
        }
        if self.source.max_candidates == 0 {
            return Err(AppError::validation("source.max_candidates must be > 0"));
        }
        url::Url::parse(&self.telegram.api_base)
            .map_err(|e| AppError::validation(format!("telegram.api_base is invalid: {e}")))?;
        if self.telegram.timeout_secs == 0 {
            return Err(AppError::validation("telegram.timeout_secs must be > 0"));
        }
        if self.cache.path.as_os_str().is_empty() {
            return Err(AppError::validation("cache.path is empty"));
        }
        if self.logging.file.is_some() && self.logging.max_bytes == 0 {
            return Err(AppError::validation("logging.max_bytes must be > 0"));
        }
        Ok(())
    }
}

/// Ranking API request settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Ranking endpoint returning the soaring token list
    #[serde(default = "defaults::source_url")]
    pub url: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// How many of the top-ranked tokens to consider per cycle
    #[serde(default = "defaults::max_candidates")]
    pub max_candidates: usize,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: defaults::source_url(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            max_candidates: defaults::max_candidates(),
        }
    }
}

/// Telegram Bot API settings. Secrets are read from the environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default = "defaults::telegram_api_base")]
    pub api_base: String,

    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    #[serde(default = "defaults::parse_mode")]
    pub parse_mode: String,

    #[serde(default)]
    pub disable_web_page_preview: bool,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            api_base: defaults::telegram_api_base(),
            timeout_secs: defaults::timeout(),
            parse_mode: defaults::parse_mode(),
            disable_web_page_preview: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// JSON file mapping token key to last-notified Unix timestamp
    #[serde(default = "defaults::cache_path")]
    pub path: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: defaults::cache_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default log filter when RUST_LOG is not set
    #[serde(default = "defaults::log_level")]
    pub level: String,

    /// Also append log lines to this file
    #[serde(default)]
    pub file: Option<PathBuf>,

    /// Rotate the log file once it reaches this size
    #[serde(default = "defaults::log_max_bytes")]
    pub max_bytes: u64,

    /// Rotated files kept as `<file>.1` .. `<file>.N`
    #[serde(default = "defaults::log_max_backups")]
    pub max_backups: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
            file: None,
            max_bytes: defaults::log_max_bytes(),
            max_backups: defaults::log_max_backups(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    pub fn source_url() -> String {
        "https://gmgn.ai/defi/quotation/v1/rank/sol/pump/1h?soaring=true".into()
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) \
         Chrome/124.0 Safari/537.36"
            .into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn max_candidates() -> usize {
        4
    }
    pub fn telegram_api_base() -> String {
        "https://api.telegram.org".into()
    }
    pub fn parse_mode() -> String {
        "HTML".into()
    }
    pub fn cache_path() -> PathBuf {
        PathBuf::from("sent_tokens.json")
    }
    pub fn log_level() -> String {
        "info".into()
    }
    pub fn log_max_bytes() -> u64 {
        1024 * 1024
    }
    pub fn log_max_backups() -> usize {
        3
    }
}
