//! Cache Store Module
//!
//! Main cache engine combining HashMap storage with LRU tracking and TTL expiration.

use std::collections::HashMap;
use std::time::Duration;

use tracing::debug;

use crate::cache::{CacheEntry, CacheStats, LruTracker, StatsSnapshot};
use crate::clock::{Clock, SystemClock};
use crate::config::MIN_TTL;
use crate::error::{CacheError, Result};

// == Cache Store ==
/// In-memory cache with LRU eviction and TTL support.
///
/// Every operation takes `&mut self` and runs to completion; wrap the store
/// in [`SharedCache`](crate::cache::SharedCache) to share it between threads.
#[derive(Debug)]
pub struct CacheStore<V, C = SystemClock> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<V>>,
    /// LRU access tracker, holds exactly the keys of `entries`
    lru: LruTracker,
    /// Performance statistics
    stats: CacheStats,
    /// Maximum number of entries allowed
    max_size: usize,
    /// TTL for entries stored without an explicit one
    default_ttl: Duration,
    clock: C,
}

impl<V: Clone> CacheStore<V, SystemClock> {
    // == Constructor ==
    /// Creates a new CacheStore with specified capacity and default TTL.
    ///
    /// # Arguments
    /// * `max_size` - Maximum number of entries the cache can hold
    /// * `default_ttl` - TTL for entries stored without an explicit one
    ///
    /// # Errors
    /// Returns [`CacheError::InvalidConfig`] when `max_size` is zero or
    /// `default_ttl` is below one millisecond.
    pub fn new(max_size: usize, default_ttl: Duration) -> Result<Self> {
        Self::with_clock(max_size, default_ttl, SystemClock)
    }
}

impl<V: Clone, C: Clock> CacheStore<V, C> {
    /// Creates a store that reads time from `clock`.
    pub fn with_clock(max_size: usize, default_ttl: Duration, clock: C) -> Result<Self> {
        if max_size == 0 {
            return Err(CacheError::InvalidConfig(
                "max_size must be greater than zero".to_string(),
            ));
        }
        if default_ttl < MIN_TTL {
            return Err(CacheError::InvalidConfig(
                "ttl must be at least 1ms".to_string(),
            ));
        }

        Ok(Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            stats: CacheStats::new(),
            max_size,
            default_ttl,
            clock,
        })
    }

    /// Current time according to the store's clock.
    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    // == Set ==
    /// Stores a key-value pair with optional TTL.
    ///
    /// If the key already exists, the entry is replaced: TTL and access count
    /// start over and the key becomes the most recently used. If the key is
    /// new and the cache is at capacity, the least recently used entry is
    /// evicted first.
    ///
    /// # Arguments
    /// * `key` - The key to store
    /// * `value` - The value to store
    /// * `ttl` - Optional TTL (uses the default TTL if None)
    pub fn set(&mut self, key: impl Into<String>, value: V, ttl: Option<Duration>) {
        let key = key.into();
        let now = self.clock.now_ms();

        if !self.entries.contains_key(&key) && self.entries.len() >= self.max_size {
            self.evict_one();
        }

        let entry = CacheEntry::new(value, ttl.unwrap_or(self.default_ttl), now);
        self.entries.insert(key.clone(), entry);
        self.lru.touch(&key);
    }

    // == Get ==
    /// Retrieves a value by key.
    ///
    /// Returns the value if found and not expired. Expired entries are
    /// removed and counted as misses.
    pub fn get(&mut self, key: &str) -> Option<V> {
        let now = self.clock.now_ms();

        let live = match self.entries.get(key) {
            Some(entry) => entry.is_live(now),
            None => {
                self.stats.record_miss();
                return None;
            }
        };

        if !live {
            self.remove_entry(key);
            self.stats.record_miss();
            debug!("Lazy expiry: removed key '{}' on read", key);
            return None;
        }

        let entry = self.entries.get_mut(key)?;
        entry.touch(now);
        let value = entry.value.clone();
        self.lru.touch(key);
        self.stats.record_hit();
        Some(value)
    }

    // == Has ==
    /// Checks whether a live entry exists.
    ///
    /// Does not count as a request and does not refresh recency. An expired
    /// entry is reaped, same as on `get`, so `size()` never keeps counting
    /// an entry that `has` already reported as gone.
    pub fn has(&mut self, key: &str) -> bool {
        let now = self.clock.now_ms();

        match self.entries.get(key).map(|entry| entry.is_live(now)) {
            Some(true) => true,
            Some(false) => {
                self.remove_entry(key);
                debug!("Lazy expiry: removed key '{}' on existence check", key);
                false
            }
            None => false,
        }
    }

    // == Delete ==
    /// Removes an entry by key, returning whether anything was removed.
    pub fn delete(&mut self, key: &str) -> bool {
        self.remove_entry(key).is_some()
    }

    // == Clear ==
    /// Removes all entries and zeroes statistics. Configuration is kept.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.lru.clear();
        self.stats.reset();
    }

    // == Views ==
    // All three views share one order: least recently used first.

    /// Snapshot of the stored keys.
    pub fn keys(&self) -> Vec<String> {
        self.lru.iter_oldest_first().cloned().collect()
    }

    /// Snapshot of the stored values.
    pub fn values(&self) -> Vec<V> {
        self.lru
            .iter_oldest_first()
            .filter_map(|key| self.entries.get(key))
            .map(|entry| entry.value.clone())
            .collect()
    }

    /// Snapshot of the stored key-value pairs.
    pub fn entries(&self) -> Vec<(String, V)> {
        self.lru
            .iter_oldest_first()
            .filter_map(|key| {
                self.entries
                    .get(key)
                    .map(|entry| (key.clone(), entry.value.clone()))
            })
            .collect()
    }

    // == Peek ==
    /// Returns an entry with its metadata, without touching stats or recency.
    pub fn peek(&self, key: &str) -> Option<&CacheEntry<V>> {
        self.entries.get(key)
    }

    /// Remaining lifetime of a live entry.
    pub fn ttl_remaining(&self, key: &str) -> Option<Duration> {
        let now = self.clock.now_ms();
        self.entries
            .get(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.ttl_remaining(now))
    }

    // == Invalidate Prefix ==
    /// Deletes every key starting with `prefix`, returning how many were removed.
    pub fn invalidate_prefix(&mut self, prefix: &str) -> usize {
        let matching: Vec<String> = self
            .entries
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect();

        for key in &matching {
            self.remove_entry(key);
        }
        matching.len()
    }

    // == Sweep Expired ==
    /// Removes all expired entries from the cache.
    ///
    /// Returns the number of entries removed.
    pub fn sweep_expired(&mut self) -> usize {
        let now = self.clock.now_ms();
        let expired_keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired_keys {
            self.remove_entry(key);
        }
        expired_keys.len()
    }

    // == Stats ==
    /// Returns current cache statistics.
    ///
    /// Entry timestamp extremes are computed over live entries only.
    pub fn stats(&self) -> StatsSnapshot {
        let now = self.clock.now_ms();
        StatsSnapshot::from_counters(
            &self.stats,
            self.entries.len(),
            self.entries
                .values()
                .filter(|entry| entry.is_live(now))
                .map(|entry| entry.inserted_at),
        )
    }

    /// Raw lifetime counters.
    pub fn counters(&self) -> &CacheStats {
        &self.stats
    }

    // == Size ==
    /// Number of stored entries, expired ones included until reaped.
    pub fn size(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // == Export / Restore ==
    /// Clones every entry, least recently used first, with the counters.
    pub(crate) fn export(&self) -> (Vec<(String, CacheEntry<V>)>, CacheStats) {
        let entries = self
            .lru
            .iter_oldest_first()
            .filter_map(|key| self.entries.get(key).map(|e| (key.clone(), e.clone())))
            .collect();
        (entries, self.stats.clone())
    }

    /// Replaces the contents with previously exported entries and counters.
    ///
    /// Expired entries are dropped. Recency is rebuilt from `last_accessed_at`
    /// with ties kept in the given order. If more entries survive than the
    /// store can hold, the least recently used ones are evicted.
    ///
    /// Returns the number of entries kept.
    pub(crate) fn restore(
        &mut self,
        mut entries: Vec<(String, CacheEntry<V>)>,
        mut stats: CacheStats,
    ) -> usize {
        let now = self.clock.now_ms();
        self.entries.clear();
        self.lru.clear();

        entries.sort_by_key(|(_, entry)| entry.last_accessed_at);
        for (key, entry) in entries {
            if entry.is_live(now) {
                self.lru.touch(&key);
                self.entries.insert(key, entry);
            }
        }

        stats.total_requests = stats.hits + stats.misses;
        self.stats = stats;

        while self.entries.len() > self.max_size {
            self.evict_one();
        }
        self.entries.len()
    }

    // == Internal Helpers ==
    fn remove_entry(&mut self, key: &str) -> Option<CacheEntry<V>> {
        let entry = self.entries.remove(key)?;
        self.lru.remove(key);
        Some(entry)
    }

    fn evict_one(&mut self) {
        if let Some(victim) = self.lru.evict_oldest() {
            self.entries.remove(&victim);
            self.stats.record_eviction();
            debug!("LRU eviction: removed key '{}'", victim);
        }
    }
}
