//! Cache Module
//!
//! Provides in-memory caching with TTL expiration, LRU eviction and
//! optional snapshot persistence.

mod entry;
mod lru;
mod manager;
mod shared;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use lru::LruTracker;
pub use manager::CacheManager;
pub use shared::SharedCache;
pub use stats::{CacheStats, StatsSnapshot};
pub use store::CacheStore;
