//! Configuration Module
//!
//! Handles loading, defaulting and validating cache configuration.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{CacheError, Result};

/// Smallest accepted default TTL; liveness is tracked in whole milliseconds.
pub const MIN_TTL: Duration = Duration::from_millis(1);

/// Default namespace for the persisted snapshot.
pub const DEFAULT_NAMESPACE: &str = "app-cache";

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    /// Default lifetime for entries stored without an explicit TTL
    pub ttl: Duration,
    /// Number of entries held before LRU eviction kicks in
    pub max_size: usize,
    /// Whether to persist snapshots to durable storage
    pub persist: bool,
    /// Slot name for the persisted snapshot; unique per logical cache
    pub namespace: String,
    /// Interval between active sweeps of expired entries
    pub sweep_interval: Duration,
    /// Maximum snapshot age still eligible for restore on startup
    pub freshness_window: Duration,
    /// Directory used by the file-backed snapshot storage
    pub storage_dir: PathBuf,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_TTL_SECS` - Default TTL in seconds (default: 300)
    /// - `CACHE_MAX_SIZE` - Maximum entries (default: 100)
    /// - `CACHE_PERSIST` - `true`/`1` to enable persistence (default: false)
    /// - `CACHE_NAMESPACE` - Snapshot slot name (default: `app-cache`)
    /// - `CACHE_SWEEP_INTERVAL_SECS` - Sweep frequency in seconds (default: 60)
    /// - `CACHE_FRESHNESS_SECS` - Snapshot freshness window in seconds (default: 3600)
    /// - `CACHE_STORAGE_DIR` - Snapshot directory (default: user cache dir)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            ttl: env_parse("CACHE_TTL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.ttl),
            max_size: env_parse("CACHE_MAX_SIZE").unwrap_or(defaults.max_size),
            persist: env::var("CACHE_PERSIST")
                .ok()
                .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "true" | "1"))
                .unwrap_or(defaults.persist),
            namespace: env::var("CACHE_NAMESPACE").unwrap_or(defaults.namespace),
            sweep_interval: env_parse("CACHE_SWEEP_INTERVAL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.sweep_interval),
            freshness_window: env_parse("CACHE_FRESHNESS_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.freshness_window),
            storage_dir: env::var("CACHE_STORAGE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.storage_dir),
        }
    }

    // == Validate ==
    /// Rejects configurations the cache cannot honour.
    ///
    /// `ttl` must be at least [`MIN_TTL`]; a sub-millisecond default would
    /// store every entry already expired.
    pub fn validate(&self) -> Result<()> {
        if self.max_size == 0 {
            return Err(CacheError::InvalidConfig(
                "max_size must be greater than zero".to_string(),
            ));
        }
        if self.ttl < MIN_TTL {
            return Err(CacheError::InvalidConfig(
                "ttl must be at least 1ms".to_string(),
            ));
        }
        if self.sweep_interval.is_zero() {
            return Err(CacheError::InvalidConfig(
                "sweep_interval must be greater than zero".to_string(),
            ));
        }
        if self.freshness_window.is_zero() {
            return Err(CacheError::InvalidConfig(
                "freshness_window must be greater than zero".to_string(),
            ));
        }
        validate_namespace(&self.namespace)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(5 * 60),
            max_size: 100,
            persist: false,
            namespace: DEFAULT_NAMESPACE.to_string(),
            sweep_interval: Duration::from_secs(60),
            freshness_window: Duration::from_secs(60 * 60),
            storage_dir: dirs::cache_dir()
                .unwrap_or_else(env::temp_dir)
                .join(DEFAULT_NAMESPACE),
        }
    }
}

/// The namespace doubles as a file name, so it is restricted to a safe alphabet.
fn validate_namespace(namespace: &str) -> Result<()> {
    if namespace.is_empty() {
        return Err(CacheError::InvalidConfig(
            "namespace cannot be empty".to_string(),
        ));
    }
    let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-');
    if !namespace.chars().all(allowed) || namespace.starts_with('.') {
        return Err(CacheError::InvalidConfig(format!(
            "namespace '{}' may only contain ASCII letters, digits, '.', '_' and '-'",
            namespace
        )));
    }
    Ok(())
}

fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}
