//! Sent-token cache with a rolling recency window.
//!
//! Maps a token's dedup key to the Unix time (seconds) it was last announced.
//! Entries older than [`EXPIRY_HORIZON`] are pruned on load and ignored on
//! query. Every mutation is written through to disk with an atomic
//! temp-file-then-rename, so a reader never sees a half-written file.
//!
//! ## File Format
//!
//! ```text
//! {
//!   "7GCihgDB8fe6KNjn2MYtkzZcRjQy3t9GHdC8uHYmW2hr": 1760870400.25,
//!   "EKpQGSJtjMFqKZ9KQanSqYXRcF8fBopzLHYxdM65zcjm": 1760874000.0
//! }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};

/// How long a notified token stays suppressed.
pub const EXPIRY_HORIZON: Duration = Duration::from_secs(24 * 60 * 60);

/// How far in the future a timestamp may lie before it is treated as bogus.
///
/// A clock that jumped backwards (or a hand-edited file) would otherwise
/// suppress a token until the wall clock catches up.
const CLOCK_SKEW_SLACK: f64 = 60.0;

/// Whether an entry stamped `sent_at` still suppresses notifications at `now`.
fn within_horizon(sent_at: f64, now: f64) -> bool {
    sent_at <= now + CLOCK_SKEW_SLACK && now - sent_at < EXPIRY_HORIZON.as_secs_f64()
}

/// Current Unix time in fractional seconds.
pub fn now_secs() -> f64 {
    Utc::now().timestamp_millis() as f64 / 1000.0
}

/// Persisted dedup store keyed by token.
#[derive(Debug, Clone)]
pub struct SentCache {
    path: PathBuf,
    entries: BTreeMap<String, f64>,
}

impl SentCache {
    /// Create an empty cache bound to `path` without touching the filesystem.
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: BTreeMap::new(),
        }
    }

    /// Load the cache from disk and drop expired entries.
    ///
    /// A missing file is a first run. An unreadable or corrupt file is logged
    /// and replaced by an empty cache; loading never fails.
    pub async fn load(path: impl Into<PathBuf>) -> Self {
        Self::load_at(path, now_secs()).await
    }

    /// [`SentCache::load`] with an explicit current time.
    pub async fn load_at(path: impl Into<PathBuf>, now: f64) -> Self {
        let mut cache = Self::empty(path);

        match cache.read_entries().await {
            Ok(Some(entries)) => {
                log::debug!("Loaded {} entries from {}", entries.len(), cache.path.display());
                cache.entries = entries;
            }
            Ok(None) => {
                log::debug!(
                    "Cache file {} not found, starting empty",
                    cache.path.display()
                );
            }
            Err(e) => {
                log::error!("{e}. Starting with an empty cache.");
            }
        }

        let removed = cache.prune_expired_at(now);
        if removed > 0 {
            log::debug!("Pruned {} expired cache entries", removed);
        }
        cache
    }

    async fn read_entries(&self) -> Result<Option<BTreeMap<String, f64>>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(AppError::cache_load(&self.path, e)),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| AppError::cache_load(&self.path, e))
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries in key order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Entry with the earliest timestamp.
    pub fn oldest(&self) -> Option<(&str, f64)> {
        self.entries().min_by(|a, b| a.1.total_cmp(&b.1))
    }

    /// Whether `key` was notified less than [`EXPIRY_HORIZON`] ago.
    ///
    /// Timestamps more than a minute in the future do not count.
    pub fn is_recent(&self, key: &str) -> bool {
        self.is_recent_at(key, now_secs())
    }

    /// [`SentCache::is_recent`] with an explicit current time.
    pub fn is_recent_at(&self, key: &str, now: f64) -> bool {
        self.entries
            .get(key)
            .is_some_and(|&sent_at| within_horizon(sent_at, now))
    }

    /// Record `key` as notified now and write the cache through to disk.
    pub async fn mark_sent(&mut self, key: &str) {
        self.mark_sent_at(key, now_secs()).await
    }

    /// [`SentCache::mark_sent`] with an explicit current time.
    ///
    /// A failed write is logged; the in-memory record is kept either way.
    pub async fn mark_sent_at(&mut self, key: &str, now: f64) {
        self.entries.insert(key.to_string(), now);
        if let Err(e) = self.persist().await {
            log::error!("{e}. {key} may be re-announced after a restart.");
        }
    }

    /// Drop entries whose age reached the horizon, or that are stamped in the
    /// future. Returns how many were removed.
    pub fn prune_expired_at(&mut self, now: f64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, sent_at| within_horizon(*sent_at, now));
        before - self.entries.len()
    }

    /// Write the whole cache atomically (write to temp, then rename).
    pub async fn persist(&self) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(&self.entries)
            .map_err(|e| AppError::persist(&self.path, e))?;
        self.write_bytes(&bytes)
            .await
            .map_err(|e| AppError::persist(&self.path, e))?;
        log::debug!(
            "Saved {} entries to {}",
            self.entries.len(),
            self.path.display()
        );
        Ok(())
    }

    async fn write_bytes(&self, bytes: &[u8]) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let tmp = self.tmp_path();
        let result = async {
            let mut file = tokio::fs::File::create(&tmp).await?;
            file.write_all(bytes).await?;
            file.flush().await?;
            file.sync_all().await?;
            drop(file);
            tokio::fs::rename(&tmp, &self.path).await
        }
        .await;

        if result.is_err() {
            // Leave no partial temp file behind
            let _ = tokio::fs::remove_file(&tmp).await;
        }
        result
    }

    /// Sibling temp file, so the rename stays on one filesystem.
    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const HOUR: f64 = 3600.0;
    const T0: f64 = 1_760_870_400.0;

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let tmp = TempDir::new().unwrap();
        let cache = SentCache::load(tmp.path().join("sent_tokens.json")).await;

        assert!(cache.is_empty());
        assert!(!cache.path().exists());
    }

    #[tokio::test]
    async fn test_expiry_window() {
        let tmp = TempDir::new().unwrap();
        let mut cache = SentCache::empty(tmp.path().join("sent.json"));

        cache.mark_sent_at("A1", T0).await;

        assert!(cache.is_recent_at("A1", T0));
        assert!(cache.is_recent_at("A1", T0 + 23.0 * HOUR));
        assert!(cache.is_recent_at("A1", T0 + 24.0 * HOUR - 0.5));
        assert!(!cache.is_recent_at("A1", T0 + 24.0 * HOUR));
        assert!(!cache.is_recent_at("A1", T0 + 48.0 * HOUR));
        assert!(!cache.is_recent_at("B2", T0));
    }

    #[tokio::test]
    async fn test_is_recent_does_not_prune() {
        let tmp = TempDir::new().unwrap();
        let mut cache = SentCache::empty(tmp.path().join("sent.json"));
        cache.mark_sent_at("A1", T0).await;

        assert!(!cache.is_recent_at("A1", T0 + 30.0 * HOUR));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_mark_sent_writes_through() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested/dir/sent.json");
        let mut cache = SentCache::empty(&path);

        cache.mark_sent_at("A1", T0).await;

        let on_disk: BTreeMap<String, f64> =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(on_disk.get("A1"), Some(&T0));
        assert!(!path.with_file_name("sent.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_mark_sent_refreshes_timestamp() {
        let tmp = TempDir::new().unwrap();
        let mut cache = SentCache::empty(tmp.path().join("sent.json"));

        cache.mark_sent_at("A1", T0).await;
        cache.mark_sent_at("A1", T0 + 20.0 * HOUR).await;

        assert_eq!(cache.len(), 1);
        assert!(cache.is_recent_at("A1", T0 + 30.0 * HOUR));
    }

    #[tokio::test]
    async fn test_load_prunes_stale_entries() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("sent.json");
        let now = now_secs();
        let json = serde_json::json!({
            "stale": now - 25.0 * HOUR,
            "fresh": now - 1.0 * HOUR,
        });
        std::fs::write(&path, json.to_string()).unwrap();

        let cache = SentCache::load(&path).await;

        assert!(!cache.is_recent("stale"));
        assert!(cache.is_recent("fresh"));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_load_accepts_integer_timestamps() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("sent.json");
        std::fs::write(&path, format!(r#"{{"A1": {}}}"#, T0 as i64)).unwrap();

        let cache = SentCache::load_at(&path, T0 + HOUR).await;

        assert!(cache.is_recent_at("A1", T0 + HOUR));
    }

    #[tokio::test]
    async fn test_corrupt_file_loads_empty() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("sent.json");
        std::fs::write(&path, b"{\"A1\": 17608").unwrap();

        let cache = SentCache::load(&path).await;

        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_persist_failure_keeps_memory_state() {
        let tmp = TempDir::new().unwrap();
        let blocker = tmp.path().join("not_a_dir");
        std::fs::write(&blocker, b"file").unwrap();
        let mut cache = SentCache::empty(blocker.join("sent.json"));

        assert!(cache.persist().await.is_err());
        cache.mark_sent_at("A1", T0).await;

        assert!(cache.is_recent_at("A1", T0 + HOUR));
    }

    #[tokio::test]
    async fn test_reload_round_trip() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("sent.json");
        let now = now_secs();

        let mut cache = SentCache::empty(&path);
        cache.mark_sent_at("A1", now - 2.0 * HOUR).await;
        cache.mark_sent_at("B2", now - HOUR).await;

        let reloaded = SentCache::load(&path).await;
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded.oldest().map(|(k, _)| k), Some("A1"));
    }

    #[tokio::test]
    async fn test_failed_persist_leaves_no_temp_file() {
        let tmp = TempDir::new().unwrap();
        // A non-empty directory where the cache file should be makes the rename fail
        let path = tmp.path().join("sent.json");
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("keep"), b"x").unwrap();
        let mut cache = SentCache::empty(&path);

        cache.mark_sent_at("A1", T0).await;

        assert!(cache.persist().await.is_err());
        assert!(!tmp.path().join("sent.json.tmp").exists());
        assert!(cache.is_recent_at("A1", T0));
    }

    #[tokio::test]
    async fn test_future_timestamps_do_not_suppress() {
        let tmp = TempDir::new().unwrap();
        let mut cache = SentCache::empty(tmp.path().join("sent.json"));

        cache.mark_sent_at("skewed", T0 + 10.0).await;
        cache.mark_sent_at("bogus", T0 + 365.0 * 24.0 * HOUR).await;

        assert!(cache.is_recent_at("skewed", T0));
        assert!(!cache.is_recent_at("bogus", T0));
        assert!(!cache.is_recent_at("bogus", T0 + 100.0 * 24.0 * HOUR));
    }

    #[tokio::test]
    async fn test_load_prunes_future_entries() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("sent.json");
        let json = serde_json::json!({
            "bogus": T0 + 30.0 * 24.0 * HOUR,
            "fresh": T0 - HOUR,
        });
        std::fs::write(&path, json.to_string()).unwrap();

        let cache = SentCache::load_at(&path, T0).await;

        assert_eq!(cache.len(), 1);
        assert!(cache.is_recent_at("fresh", T0));
        assert_eq!(cache.oldest().map(|(k, _)| k), Some("fresh"));
    }
}
