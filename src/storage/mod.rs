//! Storage for notification state.
//!
//! The only persisted state is the sent-token cache: a single JSON file
//! that survives restarts and decides whether a token was already announced
//! within the recency window.

pub mod sent_cache;

// Re-export for convenience
pub use sent_cache::{EXPIRY_HORIZON, SentCache, now_secs};
