//! Service layer for the notifier.
//!
//! This module contains the external collaborators of a cycle:
//! - Ranking fetch (`RankingClient`, a `CandidateSource`)
//! - Telegram delivery (`TelegramNotifier`, a `MessageSink`)

mod ranking;
mod telegram;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::TokenRecord;

pub use ranking::RankingClient;
pub use telegram::{TelegramCredentials, TelegramNotifier};

/// Source of ranked candidate tokens.
#[async_trait]
pub trait CandidateSource: Send + Sync {
    /// Fetch at most `limit` tokens in the source's ranking order.
    async fn fetch_candidates(&self, limit: usize) -> Result<Vec<TokenRecord>>;

    /// Release whatever the source holds for the current cycle.
    ///
    /// Called exactly once per cycle, on every exit path.
    fn release(&self) {}
}

/// Destination for token announcements.
#[async_trait]
pub trait MessageSink: Send + Sync {
    /// Deliver one formatted message about `token`.
    async fn deliver(&self, token: &TokenRecord, text: &str) -> Result<()>;
}
