// src/models/mod.rs

//! Domain models for the notifier.

mod config;
mod token;

// Re-export all public types
pub use config::{CacheConfig, Config, LoggingConfig, SourceConfig, TelegramConfig};
pub use token::{RankData, RankResponse, TokenRecord, format_usd};
