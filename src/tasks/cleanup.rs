//! TTL Cleanup Task
//!
//! Background task that periodically removes expired result cache entries.
//! The cache never cleans itself; only the server binary runs this.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::ResultCache;

/// Spawns a background task that periodically cleans up expired cache entries.
///
/// The task sleeps for `cleanup_interval_secs` between runs and takes the
/// cache write lock only for the duration of one `cleanup_expired` call.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
pub fn spawn_cleanup_task(cache: Arc<RwLock<ResultCache>>, cleanup_interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(cleanup_interval_secs);

    tokio::spawn(async move {
        info!(interval_secs = cleanup_interval_secs, "Starting cache cleanup task");

        loop {
            tokio::time::sleep(interval).await;

            let removed = {
                let mut cache_guard = cache.write().await;
                cache_guard.cleanup_expired()
            };

            if removed > 0 {
                info!(removed, "Cache cleanup removed expired entries");
            } else {
                debug!("Cache cleanup: no expired entries found");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;
    use tempfile::TempDir;

    fn shared_cache(dir: &TempDir) -> (Arc<RwLock<ResultCache>>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(1_000));
        let cache = ResultCache::open_with_clock(dir.path(), 1024 * 1024, Duration::from_secs(300), clock.clone())
            .unwrap();
        (Arc::new(RwLock::new(cache)), clock)
    }

    #[tokio::test]
    async fn test_cleanup_task_removes_expired_entries() {
        let dir = TempDir::new().unwrap();
        let (cache, clock) = shared_cache(&dir);

        cache
            .write()
            .await
            .set("expire_soon", b"document", Some(Duration::from_secs(1)));
        clock.advance(Duration::from_secs(2));

        let handle = spawn_cleanup_task(cache.clone(), 1);
        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert!(!cache.read().await.contains_key("expire_soon"));
        assert_eq!(cache.read().await.len(), 0);

        handle.abort();
    }

    #[tokio::test]
    async fn test_cleanup_task_preserves_valid_entries() {
        let dir = TempDir::new().unwrap();
        let (cache, _clock) = shared_cache(&dir);

        cache
            .write()
            .await
            .set("long_lived", b"document", Some(Duration::from_secs(3600)));

        let handle = spawn_cleanup_task(cache.clone(), 1);
        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert_eq!(cache.write().await.get("long_lived"), Some(b"document".to_vec()));

        handle.abort();
    }

    #[tokio::test]
    async fn test_cleanup_task_can_be_aborted() {
        let dir = TempDir::new().unwrap();
        let (cache, _clock) = shared_cache(&dir);

        let handle = spawn_cleanup_task(cache, 1);
        handle.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}
