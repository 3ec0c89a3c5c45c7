//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL and access metadata.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::clock::duration_to_ms;

// == Cache Entry ==
/// Represents a single cache entry with value and metadata.
///
/// Timestamps are Unix milliseconds taken from the owning store's clock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Insertion timestamp, never mutated
    pub inserted_at: u64,
    /// Lifetime measured from `inserted_at`
    #[serde(with = "duration_ms")]
    pub ttl: Duration,
    /// Number of successful reads
    pub access_count: u64,
    /// Timestamp of the last successful read (or insertion)
    pub last_accessed_at: u64,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new cache entry inserted at `now_ms`.
    ///
    /// # Arguments
    /// * `value` - The value to store
    /// * `ttl` - Lifetime of the entry
    /// * `now_ms` - Current Unix timestamp in milliseconds
    pub fn new(value: V, ttl: Duration, now_ms: u64) -> Self {
        Self {
            value,
            inserted_at: now_ms,
            ttl,
            access_count: 0,
            last_accessed_at: now_ms,
        }
    }

    // == Expiration ==
    /// Timestamp at which the entry stops being live.
    pub fn expires_at(&self) -> u64 {
        self.inserted_at.saturating_add(duration_to_ms(self.ttl))
    }

    /// Checks if the entry has expired.
    ///
    /// Boundary condition: the entry is expired once `now - inserted_at >= ttl`,
    /// so an entry read exactly at its expiry instant is already gone.
    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms >= self.expires_at()
    }

    /// Inverse of [`CacheEntry::is_expired`].
    pub fn is_live(&self, now_ms: u64) -> bool {
        !self.is_expired(now_ms)
    }

    // == Time To Live ==
    /// Returns the remaining lifetime, `Duration::ZERO` once expired.
    pub fn ttl_remaining(&self, now_ms: u64) -> Duration {
        Duration::from_millis(self.expires_at().saturating_sub(now_ms))
    }

    // == Touch ==
    /// Records a successful read.
    pub fn touch(&mut self, now_ms: u64) {
        self.access_count += 1;
        self.last_accessed_at = now_ms;
    }
}

/// Serializes a `Duration` as integer milliseconds.
mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    use crate::clock::duration_to_ms;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration_to_ms(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
