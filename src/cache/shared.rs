//! Shared Cache Module
//!
//! Thread-safe handle serialising every operation behind one lock.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::cache::{CacheManager, StatsSnapshot};
use crate::clock::{Clock, SystemClock};
use crate::config::CacheConfig;

// == Shared Cache ==
/// Cloneable handle to one [`CacheManager`].
///
/// Eviction and expiry do read-then-write sequences, so every call takes
/// the same mutex for its whole duration. The lock is never held across an
/// `.await`.
#[derive(Debug)]
pub struct SharedCache<V, C = SystemClock> {
    inner: Arc<Mutex<CacheManager<V, C>>>,
}

impl<V, C> Clone for SharedCache<V, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V, C> From<CacheManager<V, C>> for SharedCache<V, C> {
    fn from(manager: CacheManager<V, C>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(manager)),
        }
    }
}

impl<V, C> SharedCache<V, C>
where
    V: Clone + Serialize + DeserializeOwned,
    C: Clock,
{
    pub fn new(manager: CacheManager<V, C>) -> Self {
        Self::from(manager)
    }

    /// A panic while holding the lock cannot leave the maps half-updated in
    /// a way later calls care about, so poisoning is ignored.
    fn lock(&self) -> MutexGuard<'_, CacheManager<V, C>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs `f` with exclusive access, for compound operations.
    pub fn with<R>(&self, f: impl FnOnce(&mut CacheManager<V, C>) -> R) -> R {
        f(&mut self.lock())
    }

    pub fn config(&self) -> CacheConfig {
        self.lock().config().clone()
    }

    pub fn set(&self, key: impl Into<String>, value: V, ttl: Option<Duration>) {
        self.lock().set(key, value, ttl);
    }

    pub fn get(&self, key: &str) -> Option<V> {
        self.lock().get(key)
    }

    pub fn has(&self, key: &str) -> bool {
        self.lock().has(key)
    }

    pub fn delete(&self, key: &str) -> bool {
        self.lock().delete(key)
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn invalidate_prefix(&self, prefix: &str) -> usize {
        self.lock().invalidate_prefix(prefix)
    }

    pub fn sweep_expired(&self) -> usize {
        self.lock().sweep_expired()
    }

    pub fn keys(&self) -> Vec<String> {
        self.lock().keys()
    }

    pub fn values(&self) -> Vec<V> {
        self.lock().values()
    }

    pub fn entries(&self) -> Vec<(String, V)> {
        self.lock().entries()
    }

    pub fn ttl_remaining(&self, key: &str) -> Option<Duration> {
        self.lock().ttl_remaining(key)
    }

    pub fn size(&self) -> usize {
        self.lock().size()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.lock().stats()
    }

    pub fn get_or_insert_with<F>(&self, key: &str, ttl: Option<Duration>, produce: F) -> V
    where
        F: FnOnce() -> V,
    {
        self.lock().get_or_insert_with(key, ttl, produce)
    }

    /// Fallible variant of [`SharedCache::get_or_insert_with`]; an error
    /// leaves the cache untouched.
    pub fn try_get_or_insert_with<F, E>(
        &self,
        key: &str,
        ttl: Option<Duration>,
        produce: F,
    ) -> std::result::Result<V, E>
    where
        F: FnOnce() -> std::result::Result<V, E>,
    {
        self.lock().try_get_or_insert_with(key, ttl, produce)
    }

    // == Get Or Fetch ==
    /// Returns the cached value or awaits `fetch` and caches its result.
    ///
    /// The lock is released while `fetch` runs, so concurrent callers missing
    /// on the same key may each fetch; the last one to finish wins.
    pub async fn get_or_fetch<F, Fut, E>(
        &self,
        key: &str,
        ttl: Option<Duration>,
        fetch: F,
    ) -> std::result::Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<V, E>>,
    {
        if let Some(value) = self.get(key) {
            return Ok(value);
        }
        let value = fetch().await?;
        self.set(key, value.clone(), ttl);
        Ok(value)
    }
}
