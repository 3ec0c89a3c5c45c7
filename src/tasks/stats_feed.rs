//! Stats Feed Task
//!
//! Publishes cache statistics on a `watch` channel so observers (dashboards,
//! UI state) can follow them without polling the cache themselves.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::cache::{SharedCache, StatsSnapshot};
use crate::clock::Clock;

/// Spawns a task that samples `cache.stats()` every `interval`.
///
/// Receivers see the latest snapshot; a sample equal to the previous one is
/// not re-sent. The task ends on its own once every receiver is dropped.
pub fn spawn_stats_feed<V, C>(
    cache: SharedCache<V, C>,
    interval: Duration,
) -> (JoinHandle<()>, watch::Receiver<StatsSnapshot>)
where
    V: Clone + Serialize + DeserializeOwned + Send + 'static,
    C: Clock + 'static,
{
    let (tx, rx) = watch::channel(cache.stats());

    let handle = tokio::spawn(async move {
        loop {
            tokio::time::sleep(interval).await;

            if tx.is_closed() {
                debug!("Stats feed: no receivers left, stopping");
                break;
            }

            let stats = cache.stats();
            tx.send_if_modified(|current| {
                if *current == stats {
                    false
                } else {
                    *current = stats;
                    true
                }
            });
        }
    });

    (handle, rx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheManager;
    use crate::clock::ManualClock;
    use crate::config::CacheConfig;
    use crate::persistence::MemoryStorage;

    const INTERVAL: Duration = Duration::from_millis(10);

    fn shared() -> SharedCache<String, ManualClock> {
        let manager = CacheManager::from_parts(
            CacheConfig::default(),
            ManualClock::default(),
            Box::new(MemoryStorage::new()),
        )
        .unwrap();
        SharedCache::new(manager)
    }

    #[tokio::test]
    async fn test_feed_publishes_changes() {
        let cache = shared();
        let (handle, mut rx) = spawn_stats_feed(cache.clone(), INTERVAL);
        assert_eq!(rx.borrow().total_requests, 0);

        cache.set("k", "v".to_string(), None);
        cache.get("k");

        tokio::time::timeout(Duration::from_secs(2), rx.changed())
            .await
            .expect("feed should publish within the timeout")
            .unwrap();

        let stats = rx.borrow().clone();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.size, 1);

        handle.abort();
    }

    #[tokio::test]
    async fn test_feed_stops_when_receivers_dropped() {
        let (handle, rx) = spawn_stats_feed(shared(), INTERVAL);
        drop(rx);

        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("feed should stop once unobserved")
            .unwrap();
    }
}
