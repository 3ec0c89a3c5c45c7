//! Cache Manager Module
//!
//! Public cache API: a [`CacheStore`] plus optional snapshot persistence.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cache::{CacheEntry, CacheStore, StatsSnapshot};
use crate::clock::{Clock, SystemClock};
use crate::config::CacheConfig;
use crate::error::Result;
use crate::persistence::{FileStorage, PersistenceAdapter, Snapshot, SnapshotStorage};

// == Cache Manager ==
/// A configured cache with optional persistence.
///
/// With `persist` enabled, the manager restores a fresh snapshot when it is
/// constructed and writes a new one after every mutation. Persistence
/// failures are logged and never reach the caller: the in-memory cache keeps
/// working as if persistence were off.
///
/// Values must be serializable even when persistence is disabled; use
/// [`CacheStore`] directly for values that are not.
#[derive(Debug)]
pub struct CacheManager<V, C = SystemClock> {
    store: CacheStore<V, C>,
    persistence: Option<PersistenceAdapter>,
    config: CacheConfig,
}

impl<V> CacheManager<V, SystemClock>
where
    V: Clone + Serialize + DeserializeOwned,
{
    // == Constructor ==
    /// Creates a cache from configuration.
    ///
    /// Snapshots go to a [`FileStorage`] rooted at `config.storage_dir`.
    ///
    /// # Errors
    /// Returns [`CacheError::InvalidConfig`](crate::error::CacheError::InvalidConfig)
    /// if the configuration does not validate.
    pub fn new(config: CacheConfig) -> Result<Self> {
        let storage = FileStorage::new(config.storage_dir.clone());
        Self::from_parts(config, SystemClock, Box::new(storage))
    }

    /// Creates a cache that persists to `storage` instead of the filesystem.
    pub fn with_storage(config: CacheConfig, storage: impl SnapshotStorage + 'static) -> Result<Self> {
        Self::from_parts(config, SystemClock, Box::new(storage))
    }
}

impl<V, C> CacheManager<V, C>
where
    V: Clone + Serialize + DeserializeOwned,
    C: Clock,
{
    /// Creates a cache with an explicit clock and storage medium.
    ///
    /// `storage` is ignored unless `config.persist` is set.
    pub fn from_parts(
        config: CacheConfig,
        clock: C,
        storage: Box<dyn SnapshotStorage>,
    ) -> Result<Self> {
        config.validate()?;

        let store = CacheStore::with_clock(config.max_size, config.ttl, clock)?;
        let persistence = config.persist.then(|| {
            PersistenceAdapter::new(storage, config.namespace.clone(), config.freshness_window)
        });

        let mut manager = Self {
            store,
            persistence,
            config,
        };
        manager.load_snapshot();

        info!(
            "Cache '{}' ready: max_size={}, ttl={}s, persist={}, entries={}",
            manager.config.namespace,
            manager.config.max_size,
            manager.config.ttl.as_secs(),
            manager.config.persist,
            manager.store.size()
        );
        Ok(manager)
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn is_persistent(&self) -> bool {
        self.persistence.is_some()
    }

    // == Set ==
    /// Inserts or overwrites an entry, evicting the LRU entry if full.
    pub fn set(&mut self, key: impl Into<String>, value: V, ttl: Option<Duration>) {
        self.store.set(key, value, ttl);
        self.persist();
    }

    // == Get ==
    /// Returns a live value, recording a hit or a miss.
    pub fn get(&mut self, key: &str) -> Option<V> {
        self.store.get(key)
    }

    // == Has ==
    /// Checks for a live entry without affecting stats or recency.
    pub fn has(&mut self, key: &str) -> bool {
        self.store.has(key)
    }

    // == Delete ==
    pub fn delete(&mut self, key: &str) -> bool {
        let removed = self.store.delete(key);
        if removed {
            self.persist();
        }
        removed
    }

    // == Clear ==
    /// Empties the cache and zeroes stats; the empty state is persisted.
    pub fn clear(&mut self) {
        self.store.clear();
        self.persist();
    }

    // == Get Or Insert ==
    /// Returns the cached value, or stores and returns the one `produce` builds.
    pub fn get_or_insert_with<F>(&mut self, key: &str, ttl: Option<Duration>, produce: F) -> V
    where
        F: FnOnce() -> V,
    {
        if let Some(value) = self.get(key) {
            return value;
        }
        let value = produce();
        self.set(key, value.clone(), ttl);
        value
    }

    /// Fallible form of [`CacheManager::get_or_insert_with`].
    ///
    /// Nothing is stored when `produce` fails.
    pub fn try_get_or_insert_with<F, E>(
        &mut self,
        key: &str,
        ttl: Option<Duration>,
        produce: F,
    ) -> std::result::Result<V, E>
    where
        F: FnOnce() -> std::result::Result<V, E>,
    {
        if let Some(value) = self.get(key) {
            return Ok(value);
        }
        let value = produce()?;
        self.set(key, value.clone(), ttl);
        Ok(value)
    }

    // == Invalidate Prefix ==
    pub fn invalidate_prefix(&mut self, prefix: &str) -> usize {
        let removed = self.store.invalidate_prefix(prefix);
        if removed > 0 {
            self.persist();
        }
        removed
    }

    // == Sweep Expired ==
    /// Removes every expired entry, returning how many were removed.
    pub fn sweep_expired(&mut self) -> usize {
        let removed = self.store.sweep_expired();
        if removed > 0 {
            self.persist();
        }
        removed
    }

    // == Views ==
    pub fn keys(&self) -> Vec<String> {
        self.store.keys()
    }

    pub fn values(&self) -> Vec<V> {
        self.store.values()
    }

    pub fn entries(&self) -> Vec<(String, V)> {
        self.store.entries()
    }

    pub fn peek(&self, key: &str) -> Option<&CacheEntry<V>> {
        self.store.peek(key)
    }

    pub fn ttl_remaining(&self, key: &str) -> Option<Duration> {
        self.store.ttl_remaining(key)
    }

    pub fn size(&self) -> usize {
        self.store.size()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.store.stats()
    }

    // == Persistence ==
    fn load_snapshot(&mut self) {
        let adapter = match &self.persistence {
            Some(adapter) => adapter,
            None => return,
        };

        match adapter.load::<V>(self.store.now_ms()) {
            Ok(Some(snapshot)) => {
                let offered = snapshot.entries.len();
                let restored = self.store.restore(snapshot.entries, snapshot.stats);
                info!(
                    "Restored {} of {} entries from snapshot '{}'",
                    restored,
                    offered,
                    adapter.namespace()
                );
            }
            Ok(None) => {
                debug!("No snapshot to restore for '{}'", adapter.namespace());
            }
            Err(e) => {
                warn!(
                    "Ignoring unreadable snapshot '{}': {}",
                    adapter.namespace(),
                    e
                );
                if let Err(e) = adapter.discard() {
                    warn!(
                        "Failed to discard snapshot '{}': {}",
                        adapter.namespace(),
                        e
                    );
                }
            }
        }
    }

    fn persist(&self) {
        let adapter = match &self.persistence {
            Some(adapter) => adapter,
            None => return,
        };

        let (entries, stats) = self.store.export();
        let snapshot = Snapshot::new(entries, stats, self.store.now_ms());
        if let Err(e) = adapter.save(&snapshot) {
            warn!(
                "Failed to persist snapshot '{}': {}",
                adapter.namespace(),
                e
            );
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::{CacheError, Result};
    use crate::persistence::MemoryStorage;

    #[derive(Debug)]
    struct BrokenStorage;

    impl SnapshotStorage for BrokenStorage {
        fn read(&self, _namespace: &str) -> Result<Option<String>> {
            Err(CacheError::Storage("read refused".to_string()))
        }

        fn write(&self, _namespace: &str, _data: &str) -> Result<()> {
            Err(CacheError::Storage("quota exceeded".to_string()))
        }

        fn remove(&self, _namespace: &str) -> Result<()> {
            Err(CacheError::Storage("remove refused".to_string()))
        }
    }

    fn persistent_config() -> CacheConfig {
        CacheConfig {
            persist: true,
            namespace: "manager-test".to_string(),
            ..CacheConfig::default()
        }
    }

    fn manager(
        config: CacheConfig,
        clock: &ManualClock,
        storage: &MemoryStorage,
    ) -> CacheManager<String, ManualClock> {
        CacheManager::from_parts(config, clock.clone(), Box::new(storage.clone())).unwrap()
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = CacheConfig {
            max_size: 0,
            ..CacheConfig::default()
        };
        let result = CacheManager::<String>::with_storage(config, MemoryStorage::new());
        assert!(matches!(result, Err(CacheError::InvalidConfig(_))));
    }

    #[test]
    fn test_non_persistent_never_writes() {
        let clock = ManualClock::default();
        let storage = MemoryStorage::new();
        let mut cache = manager(CacheConfig::default(), &clock, &storage);

        cache.set("k", "v".to_string(), None);

        assert!(!cache.is_persistent());
        assert_eq!(storage.read("app-cache").unwrap(), None);
    }

    #[test]
    fn test_mutations_write_snapshot() {
        let clock = ManualClock::default();
        let storage = MemoryStorage::new();
        let mut cache = manager(persistent_config(), &clock, &storage);

        cache.set("k", "v".to_string(), None);
        let raw = storage.read("manager-test").unwrap().unwrap();
        let snapshot: Snapshot<String> = serde_json::from_str(&raw).unwrap();
        assert_eq!(snapshot.entries.len(), 1);
        assert_eq!(snapshot.timestamp, clock.now_ms());

        cache.delete("k");
        let raw = storage.read("manager-test").unwrap().unwrap();
        let snapshot: Snapshot<String> = serde_json::from_str(&raw).unwrap();
        assert!(snapshot.entries.is_empty());
    }

    #[test]
    fn test_restore_within_freshness_window() {
        let clock = ManualClock::default();
        let storage = MemoryStorage::new();

        let mut first = manager(persistent_config(), &clock, &storage);
        first.set("a", "1".to_string(), None);
        first.get("a");
        first.set("b", "2".to_string(), None);
        drop(first);

        clock.advance(Duration::from_secs(60));
        let mut second = manager(persistent_config(), &clock, &storage);

        assert_eq!(second.size(), 2);
        assert_eq!(second.stats().hits, 1);
        assert_eq!(second.get("a"), Some("1".to_string()));
    }

    #[test]
    fn test_stale_snapshot_starts_empty() {
        let clock = ManualClock::default();
        let storage = MemoryStorage::new();

        let mut first = manager(persistent_config(), &clock, &storage);
        first.set("a", "1".to_string(), Some(Duration::from_secs(7200)));
        drop(first);

        clock.advance(Duration::from_secs(3601));
        let second = manager(persistent_config(), &clock, &storage);

        assert!(second.is_empty());
        assert_eq!(storage.read("manager-test").unwrap(), None);
    }

    #[test]
    fn test_corrupt_snapshot_is_cleared() {
        let clock = ManualClock::default();
        let storage = MemoryStorage::new();
        storage.write("manager-test", "not json at all").unwrap();

        let mut cache = manager(persistent_config(), &clock, &storage);

        assert!(cache.is_empty());
        assert_eq!(storage.read("manager-test").unwrap(), None);
        cache.set("k", "v".to_string(), None);
        assert_eq!(cache.get("k"), Some("v".to_string()));
    }

    #[test]
    fn test_broken_storage_does_not_break_operations() {
        let clock = ManualClock::default();
        let mut cache: CacheManager<String, ManualClock> =
            CacheManager::from_parts(persistent_config(), clock, Box::new(BrokenStorage)).unwrap();

        cache.set("k", "v".to_string(), None);
        assert_eq!(cache.get("k"), Some("v".to_string()));
        assert!(cache.delete("k"));
        assert_eq!(cache.get("k"), None);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_get_or_insert_with() {
        let clock = ManualClock::default();
        let mut cache = manager(CacheConfig::default(), &clock, &MemoryStorage::new());
        let mut calls = 0;

        let first = cache.get_or_insert_with("prompt:1", None, || {
            calls += 1;
            "fetched".to_string()
        });
        let second = cache.get_or_insert_with("prompt:1", None, || {
            calls += 1;
            "refetched".to_string()
        });

        assert_eq!(first, "fetched");
        assert_eq!(second, "fetched");
        assert_eq!(calls, 1);
        assert_eq!(cache.stats().misses, 1);
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn test_try_get_or_insert_with_error_stores_nothing() {
        let clock = ManualClock::default();
        let mut cache = manager(CacheConfig::default(), &clock, &MemoryStorage::new());

        let result: std::result::Result<String, &str> =
            cache.try_get_or_insert_with("prompt:1", None, || Err("backend down"));

        assert_eq!(result, Err("backend down"));
        assert!(!cache.has("prompt:1"));

        let result: std::result::Result<String, &str> =
            cache.try_get_or_insert_with("prompt:1", None, || Ok("ok".to_string()));
        assert_eq!(result, Ok("ok".to_string()));
        assert!(cache.has("prompt:1"));
    }

    #[test]
    fn test_sweep_persists_only_when_something_expired() {
        let clock = ManualClock::default();
        let storage = MemoryStorage::new();
        let mut cache = manager(persistent_config(), &clock, &storage);

        assert_eq!(cache.sweep_expired(), 0);
        assert_eq!(storage.read("manager-test").unwrap(), None);

        cache.set("short", "v".to_string(), Some(Duration::from_secs(1)));
        clock.advance(Duration::from_secs(2));
        assert_eq!(cache.sweep_expired(), 1);

        let raw = storage.read("manager-test").unwrap().unwrap();
        let snapshot: Snapshot<String> = serde_json::from_str(&raw).unwrap();
        assert!(snapshot.entries.is_empty());
    }
}
