//! App Cache - A TTL + LRU in-memory cache
//!
//! Generic key-value cache with per-entry expiration, least-recently-used
//! eviction, hit/miss statistics and optional snapshot persistence.
//!
//! ```ignore
//! use app_cache::{CacheConfig, CacheManager, SharedCache, spawn_sweep_task};
//!
//! let cache = SharedCache::new(CacheManager::<String>::new(CacheConfig::from_env())?);
//! let sweeper = spawn_sweep_task(cache.clone(), cache.config().sweep_interval);
//!
//! cache.set("prompt:42", "Think step by step".to_string(), None);
//! assert!(cache.get("prompt:42").is_some());
//! ```

pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod persistence;
pub mod tasks;

pub use cache::{CacheEntry, CacheManager, CacheStore, SharedCache, StatsSnapshot};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
pub use persistence::{FileStorage, MemoryStorage, SnapshotStorage};
pub use tasks::{spawn_stats_feed, spawn_sweep_task};
