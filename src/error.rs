// src/error.rs

//! Unified error handling for the notifier.

use std::fmt;
use std::path::Path;

use thiserror::Error;

/// Result type alias for notifier operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// A required secret was not supplied
    #[error("Missing credential: {0} is not set")]
    MissingCredential(&'static str),

    /// The ranking source could not be reached or returned unusable data
    #[error("Fetch error for {context}: {message}")]
    Fetch { context: String, message: String },

    /// The messaging sink rejected or never received a message
    #[error("Delivery error for {token}: {message}")]
    Delivery { token: String, message: String },

    /// The sent-token cache could not be written
    #[error("Persist error for {path}: {message}")]
    Persist { path: String, message: String },

    /// The sent-token cache could not be read or parsed
    #[error("Cache load error for {path}: {message}")]
    CacheLoad { path: String, message: String },
}

impl AppError {
    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a fetch error with context.
    pub fn fetch(context: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Fetch {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Create a delivery error for a token.
    pub fn delivery(token: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Delivery {
            token: token.into(),
            message: message.to_string(),
        }
    }

    /// Create a persist error for a cache path.
    pub fn persist(path: &Path, message: impl fmt::Display) -> Self {
        Self::Persist {
            path: path.display().to_string(),
            message: message.to_string(),
        }
    }

    /// Create a cache load error for a cache path.
    pub fn cache_load(path: &Path, message: impl fmt::Display) -> Self {
        Self::CacheLoad {
            path: path.display().to_string(),
            message: message.to_string(),
        }
    }
}
