//! Pipeline entry points for notifier operations.
//!
//! - `Notifier::run_once`: fetch ranked tokens, skip recent ones, announce the rest
//! - `run_cycle`: wire the configured collaborators and run one cycle

pub mod notify;

pub use notify::{CycleReport, Notifier};

use crate::error::Result;
use crate::models::Config;
use crate::services::{RankingClient, TelegramCredentials, TelegramNotifier};
use crate::storage::SentCache;

/// Load the cache, build the HTTP collaborators and run one cycle.
pub async fn run_cycle(config: &Config, credentials: TelegramCredentials) -> Result<CycleReport> {
    let mut cache = SentCache::load(&config.cache.path).await;
    log::info!(
        "Loaded {} recent entries from {}",
        cache.len(),
        cache.path().display()
    );

    let source = RankingClient::new(config.source.clone());
    let sink = TelegramNotifier::new(config.telegram.clone(), credentials)?;

    Notifier::new(&source, &sink, &mut cache, config.source.max_candidates)
        .run_once()
        .await
}
