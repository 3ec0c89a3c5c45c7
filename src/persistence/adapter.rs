//! Persistence Adapter Module
//!
//! Saves cache snapshots to a namespaced slot and loads them back when fresh.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::info;

use crate::clock::duration_to_ms;
use crate::error::Result;
use crate::persistence::{Snapshot, SnapshotStorage};

// == Persistence Adapter ==
/// Reads and writes one cache's snapshot slot.
///
/// Every method reports failures; deciding to log and carry on is left to
/// the cache manager.
#[derive(Debug)]
pub struct PersistenceAdapter {
    storage: Box<dyn SnapshotStorage>,
    namespace: String,
    freshness_window: Duration,
}

impl PersistenceAdapter {
    /// # Arguments
    /// * `storage` - Durable medium holding the slot
    /// * `namespace` - Slot name, unique per logical cache
    /// * `freshness_window` - Maximum snapshot age accepted by `load`
    pub fn new(
        storage: Box<dyn SnapshotStorage>,
        namespace: impl Into<String>,
        freshness_window: Duration,
    ) -> Self {
        Self {
            storage,
            namespace: namespace.into(),
            freshness_window,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn freshness_window(&self) -> Duration {
        self.freshness_window
    }

    // == Save ==
    /// Serializes and writes the snapshot, replacing the previous one.
    pub fn save<V: Serialize>(&self, snapshot: &Snapshot<V>) -> Result<()> {
        let data = serde_json::to_string(snapshot)?;
        self.storage.write(&self.namespace, &data)
    }

    // == Load ==
    /// Reads the snapshot if one exists and is younger than the freshness window.
    ///
    /// A stale snapshot is removed from storage and reported as `Ok(None)`.
    /// Unparseable data is an error; the slot is left for the caller to discard.
    pub fn load<V: DeserializeOwned>(&self, now_ms: u64) -> Result<Option<Snapshot<V>>> {
        let data = match self.storage.read(&self.namespace)? {
            Some(data) => data,
            None => return Ok(None),
        };

        let snapshot: Snapshot<V> = serde_json::from_str(&data)?;
        let age = snapshot.age_ms(now_ms);
        if age >= duration_to_ms(self.freshness_window) {
            info!(
                "Discarding stale snapshot '{}' ({}s old)",
                self.namespace,
                age / 1000
            );
            self.discard()?;
            return Ok(None);
        }

        Ok(Some(snapshot))
    }

    // == Discard ==
    /// Deletes the slot.
    pub fn discard(&self) -> Result<()> {
        self.storage.remove(&self.namespace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheEntry, CacheStats};
    use crate::error::CacheError;
    use crate::persistence::MemoryStorage;

    const HOUR: Duration = Duration::from_secs(3600);
    const NOW: u64 = 1_700_000_000_000;

    fn adapter(storage: &MemoryStorage) -> PersistenceAdapter {
        PersistenceAdapter::new(Box::new(storage.clone()), "test-cache", HOUR)
    }

    fn sample_snapshot(timestamp: u64) -> Snapshot<String> {
        Snapshot::new(
            vec![(
                "k".to_string(),
                CacheEntry::new("v".to_string(), Duration::from_secs(300), timestamp),
            )],
            CacheStats::new(),
            timestamp,
        )
    }

    #[test]
    fn test_save_then_load_fresh() {
        let storage = MemoryStorage::new();
        let adapter = adapter(&storage);

        adapter.save(&sample_snapshot(NOW)).unwrap();
        let loaded: Snapshot<String> = adapter.load(NOW + 59 * 60 * 1000).unwrap().unwrap();

        assert_eq!(loaded, sample_snapshot(NOW));
    }

    #[test]
    fn test_load_missing_slot() {
        let storage = MemoryStorage::new();
        let loaded: Option<Snapshot<String>> = adapter(&storage).load(NOW).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_load_stale_snapshot_is_discarded() {
        let storage = MemoryStorage::new();
        let adapter = adapter(&storage);

        adapter.save(&sample_snapshot(NOW)).unwrap();
        let loaded: Option<Snapshot<String>> = adapter.load(NOW + duration_to_ms(HOUR)).unwrap();

        assert!(loaded.is_none());
        assert_eq!(storage.read("test-cache").unwrap(), None);
    }

    #[test]
    fn test_huge_freshness_window_keeps_old_snapshot() {
        let storage = MemoryStorage::new();
        let adapter = PersistenceAdapter::new(Box::new(storage.clone()), "test-cache", Duration::MAX);

        adapter.save(&sample_snapshot(0)).unwrap();
        let loaded: Option<Snapshot<String>> = adapter.load(NOW).unwrap();

        assert!(loaded.is_some());
    }

    #[test]
    fn test_load_corrupt_snapshot_is_an_error() {
        let storage = MemoryStorage::new();
        storage.write("test-cache", "{\"entries\": oops").unwrap();

        let result: Result<Option<Snapshot<String>>> = adapter(&storage).load(NOW);
        assert!(matches!(result, Err(CacheError::Serialization(_))));
    }

    #[test]
    fn test_namespaces_do_not_collide() {
        let storage = MemoryStorage::new();
        let first = PersistenceAdapter::new(Box::new(storage.clone()), "first", HOUR);
        let second = PersistenceAdapter::new(Box::new(storage.clone()), "second", HOUR);

        first.save(&sample_snapshot(NOW)).unwrap();

        let loaded: Option<Snapshot<String>> = second.load(NOW).unwrap();
        assert!(loaded.is_none());
        assert_eq!(first.namespace(), "first");
    }
}
