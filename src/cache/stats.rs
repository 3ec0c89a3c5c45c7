//! Cache Statistics Module
//!
//! Tracks cache performance metrics including hits, misses, and evictions.

use serde::{Deserialize, Serialize};

// == Cache Stats ==
/// Lifetime counters of a cache store, reset only by `clear`.
///
/// This is the part of the statistics that gets persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    /// Number of `get` calls that found a live entry
    pub hits: u64,
    /// Number of `get` calls that found nothing or an expired entry
    pub misses: u64,
    /// Always `hits + misses`
    pub total_requests: u64,
    /// Number of entries evicted due to LRU policy
    #[serde(default)]
    pub evictions: u64,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / total_requests, or 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.hits as f64 / self.total_requests as f64
        }
    }

    // == Record Hit ==
    pub fn record_hit(&mut self) {
        self.hits += 1;
        self.total_requests += 1;
    }

    // == Record Miss ==
    pub fn record_miss(&mut self) {
        self.misses += 1;
        self.total_requests += 1;
    }

    // == Record Eviction ==
    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    // == Reset ==
    /// Zeroes every counter.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

// == Stats Snapshot ==
/// Read-only view of the cache, computed on demand.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    /// Stored entries, including expired ones not yet reaped
    pub size: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub hit_rate: f64,
    pub total_requests: u64,
    /// Earliest insertion timestamp among live entries
    pub oldest_entry: Option<u64>,
    /// Latest insertion timestamp among live entries
    pub newest_entry: Option<u64>,
}

impl StatsSnapshot {
    /// Builds a snapshot from the counters and the live insertion timestamps.
    pub fn from_counters(
        stats: &CacheStats,
        size: usize,
        live_inserted_at: impl IntoIterator<Item = u64>,
    ) -> Self {
        let (oldest_entry, newest_entry) =
            live_inserted_at
                .into_iter()
                .fold((None, None), |(oldest, newest): (Option<u64>, Option<u64>), ts| {
                    (
                        Some(oldest.map_or(ts, |o| o.min(ts))),
                        Some(newest.map_or(ts, |n| n.max(ts))),
                    )
                });

        Self {
            size,
            hits: stats.hits,
            misses: stats.misses,
            evictions: stats.evictions,
            hit_rate: stats.hit_rate(),
            total_requests: stats.total_requests,
            oldest_entry,
            newest_entry,
        }
    }
}
