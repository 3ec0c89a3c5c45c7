//! Snapshot Module
//!
//! The record written to durable storage.

use serde::{Deserialize, Serialize};

use crate::cache::{CacheEntry, CacheStats};

// == Snapshot ==
/// Serialized state of a cache.
///
/// Encoded as JSON:
/// `{"entries": [[key, entry], ...], "stats": {...}, "timestamp": ms}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot<V> {
    /// Entries, least recently used first
    pub entries: Vec<(String, CacheEntry<V>)>,
    pub stats: CacheStats,
    /// Unix milliseconds at time of write
    pub timestamp: u64,
}

impl<V> Snapshot<V> {
    pub fn new(entries: Vec<(String, CacheEntry<V>)>, stats: CacheStats, timestamp: u64) -> Self {
        Self {
            entries,
            stats,
            timestamp,
        }
    }

    /// Age of the snapshot at `now_ms`.
    pub fn age_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.timestamp)
    }
}
