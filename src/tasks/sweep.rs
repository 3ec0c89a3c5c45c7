//! TTL Sweep Task
//!
//! Background task that periodically removes expired cache entries, so
//! entries that are written and never read do not pile up.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::SharedCache;
use crate::clock::Clock;

/// Spawns a background task that periodically sweeps expired cache entries.
///
/// The task runs in an infinite loop, sleeping for the specified interval
/// between sweeps. Each sweep holds the cache lock only for the duration of
/// the pass.
///
/// # Arguments
/// * `cache` - Handle to the cache to sweep
/// * `interval` - Time between sweeps, usually `config.sweep_interval`
///
/// # Returns
/// A JoinHandle for the spawned task; abort it to stop sweeping.
///
/// # Example
/// ```ignore
/// let cache = SharedCache::new(CacheManager::<String>::new(CacheConfig::default())?);
/// let sweeper = spawn_sweep_task(cache.clone(), cache.config().sweep_interval);
/// // Later, during shutdown:
/// sweeper.abort();
/// ```
pub fn spawn_sweep_task<V, C>(cache: SharedCache<V, C>, interval: Duration) -> JoinHandle<()>
where
    V: Clone + Serialize + DeserializeOwned + Send + 'static,
    C: Clock + 'static,
{
    tokio::spawn(async move {
        info!(
            "Starting TTL sweep task with interval of {}ms",
            interval.as_millis()
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = cache.sweep_expired();

            if removed > 0 {
                info!("TTL sweep: removed {} expired entries", removed);
            } else {
                debug!("TTL sweep: no expired entries found");
            }
        }
    })
}
