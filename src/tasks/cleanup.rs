//! TTL Cleanup Task
//!
//! Background task that periodically purges expired cache entries, so memory
//! held by expired values is released even when no writes arrive.

use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::{Clock, Sizer, TtlCache};

/// Spawns a background task that periodically calls [`TtlCache::expire`].
///
/// The task runs in an infinite loop, sleeping for the specified interval
/// between runs and holding the cache lock only for the purge itself.
///
/// # Arguments
/// * `cache` - shared cache, one lock per instance
/// * `cleanup_interval_secs` - Interval in seconds between cleanup runs
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let cache = Arc::new(Mutex::new(TtlCache::new(1000, Duration::from_secs(300))));
/// let cleanup_handle = spawn_cleanup_task(cache.clone(), 1);
/// // Later, during shutdown:
/// cleanup_handle.abort();
/// ```
pub fn spawn_cleanup_task<K, V, C, S>(
    cache: Arc<Mutex<TtlCache<K, V, C, S>>>,
    cleanup_interval_secs: u64,
) -> JoinHandle<()>
where
    K: Hash + Eq + Clone + Debug + Send + 'static,
    V: Send + 'static,
    C: Clock + Send + 'static,
    S: Sizer<V> + Send + 'static,
{
    let interval = Duration::from_secs(cleanup_interval_secs);

    tokio::spawn(async move {
        info!(
            "Starting TTL cleanup task with interval of {} seconds",
            cleanup_interval_secs
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = {
                let mut cache_guard = cache.lock().await;
                cache_guard.expire()
            };

            if removed > 0 {
                info!("TTL cleanup: purged {} expired entries", removed);
            } else {
                debug!("TTL cleanup: no expired entries found");
            }
        }
    })
}
