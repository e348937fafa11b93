// src/pipeline/notify.rs

//! One fetch → filter → deliver → record cycle.

use crate::error::Result;
use crate::services::{CandidateSource, MessageSink};
use crate::storage::SentCache;

/// What happened to each candidate of a cycle, by dedup key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Number of candidates returned by the source
    pub fetched: usize,
    /// Already announced within the recency window
    pub skipped: Vec<String>,
    /// Delivered and recorded
    pub delivered: Vec<String>,
    /// Delivery failed; will be retried next cycle
    pub failed: Vec<String>,
}

impl CycleReport {
    /// Whether every attempted delivery went through.
    pub fn all_delivered(&self) -> bool {
        self.failed.is_empty()
    }

    /// Summary rows for logging.
    pub fn summary(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Fetched", self.fetched.to_string()),
            ("Skipped (recent)", self.skipped.len().to_string()),
            ("Delivered", self.delivered.len().to_string()),
            ("Failed", self.failed.len().to_string()),
        ]
    }
}

/// Releases the source's per-cycle resources when dropped.
struct ReleaseGuard<'a>(&'a dyn CandidateSource);

impl Drop for ReleaseGuard<'_> {
    fn drop(&mut self) {
        self.0.release();
    }
}

/// Drives a single notification cycle.
pub struct Notifier<'a> {
    source: &'a dyn CandidateSource,
    sink: &'a dyn MessageSink,
    cache: &'a mut SentCache,
    max_candidates: usize,
}

impl<'a> Notifier<'a> {
    pub fn new(
        source: &'a dyn CandidateSource,
        sink: &'a dyn MessageSink,
        cache: &'a mut SentCache,
        max_candidates: usize,
    ) -> Self {
        Self {
            source,
            sink,
            cache,
            max_candidates,
        }
    }

    /// Run one cycle.
    ///
    /// Fails only when the candidates could not be fetched; in that case the
    /// cache is left untouched. Delivery failures are logged and reported.
    pub async fn run_once(&mut self) -> Result<CycleReport> {
        let _release = ReleaseGuard(self.source);

        let mut candidates = match self.source.fetch_candidates(self.max_candidates).await {
            Ok(candidates) => candidates,
            Err(e) => {
                log::error!("Fetching candidates failed: {}", e);
                return Err(e);
            }
        };

        if candidates.len() > self.max_candidates {
            log::debug!(
                "Source returned {} candidates, keeping the top {}",
                candidates.len(),
                self.max_candidates
            );
            candidates.truncate(self.max_candidates);
        }

        log::info!("Fetched {} candidates", candidates.len());
        let mut report = CycleReport {
            fetched: candidates.len(),
            ..CycleReport::default()
        };

        for token in &candidates {
            let key = token.dedup_key();

            if self.cache.is_recent(key) {
                log::info!("Skipping {}: already sent within 24h", token.label());
                report.skipped.push(key.to_string());
                continue;
            }

            log::info!("Sending notification for {}", token.label());
            match self.sink.deliver(token, &token.format_message()).await {
                Ok(()) => {
                    log::info!("Sent notification for {}", token.label());
                    self.cache.mark_sent(key).await;
                    report.delivered.push(key.to_string());
                }
                Err(e) => {
                    log::error!("Failed to send notification for {}: {}", token.label(), e);
                    report.failed.push(key.to_string());
                }
            }
        }

        Ok(report)
    }
}
