//! Background Expiry Sweeper
//!
//! Correctness never depends on this task: the store already treats expired
//! keys as absent and evicts them when they are touched. A key that expires and
//! is never touched again would stay in memory forever, though, so this task
//! periodically purges expired keys from every shard.
//!
//! ## Adaptive Frequency
//!
//! If many keys are expiring, the sweeper runs more often.
//! If nothing is expiring, it backs off to save CPU.

use crate::storage::StringStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, trace};

/// Configuration for the expiry sweeper.
#[derive(Debug, Clone)]
pub struct ExpiryConfig {
    /// Base interval between sweeps (default: 100ms)
    pub base_interval: Duration,

    /// Minimum interval between sweeps (default: 10ms)
    pub min_interval: Duration,

    /// Maximum interval between sweeps (default: 1s)
    pub max_interval: Duration,

    /// If this fraction of stored keys were expired, speed up sweeping
    pub speedup_threshold: f64,
}

impl Default for ExpiryConfig {
    fn default() -> Self {
        Self {
            base_interval: Duration::from_millis(100),
            min_interval: Duration::from_millis(10),
            max_interval: Duration::from_secs(1),
            speedup_threshold: 0.25,
        }
    }
}

/// A handle to the running expiry sweeper.
///
/// When this handle is dropped, the sweeper task will be stopped.
#[derive(Debug)]
pub struct ExpirySweeper {
    shutdown_tx: watch::Sender<bool>,
}

impl ExpirySweeper {
    /// Starts the expiry sweeper as a background task.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use stringkv::storage::{StringStore, ExpirySweeper, ExpiryConfig};
    /// use std::sync::Arc;
    ///
    /// let store = Arc::new(StringStore::new());
    /// let sweeper = ExpirySweeper::start(store, ExpiryConfig::default());
    ///
    /// // Dropping the sweeper will stop it
    /// drop(sweeper);
    /// ```
    pub fn start(store: Arc<StringStore>, config: ExpiryConfig) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        info!(
            base_interval_ms = config.base_interval.as_millis() as u64,
            "Background expiry sweeper started"
        );
        tokio::spawn(sweeper_loop(store, config, shutdown_rx));

        Self { shutdown_tx }
    }

    /// Stops the expiry sweeper.
    ///
    /// This is called automatically when the handle is dropped.
    pub fn stop(&self) {
        if self.shutdown_tx.send(true).is_ok() {
            info!("Background expiry sweeper stopped");
        }
    }
}

impl Drop for ExpirySweeper {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Picks the next sleep interval from how much the last sweep removed.
fn next_interval(current: Duration, removed: u64, keys_before: u64, config: &ExpiryConfig) -> Duration {
    if keys_before == 0 || removed == 0 {
        return (current * 2).min(config.max_interval);
    }

    let expiry_rate = removed as f64 / keys_before as f64;
    if expiry_rate > config.speedup_threshold {
        (current / 2).max(config.min_interval)
    } else {
        current
    }
}

async fn sweeper_loop(
    store: Arc<StringStore>,
    config: ExpiryConfig,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut current_interval = config.base_interval;

    loop {
        tokio::select! {
            _ = tokio::time::sleep(current_interval) => {}
            result = shutdown_rx.changed() => {
                if result.is_err() || *shutdown_rx.borrow() {
                    debug!("Expiry sweeper received shutdown signal");
                    return;
                }
            }
        }

        let keys_before = store.len();
        let removed = store.purge_expired();
        let interval = next_interval(current_interval, removed, keys_before, &config);

        if interval < current_interval {
            debug!(
                removed,
                new_interval_ms = interval.as_millis() as u64,
                "High expiry rate, speeding up sweeper"
            );
        } else if interval > current_interval {
            trace!(
                new_interval_ms = interval.as_millis() as u64,
                "Nothing expired, slowing down sweeper"
            );
        }
        current_interval = interval;

        if removed > 0 {
            debug!(removed, keys_remaining = store.len(), "Expired keys purged");
        }
    }
}

/// Starts the expiry sweeper with default configuration.
pub fn start_expiry_sweeper(store: Arc<StringStore>) -> ExpirySweeper {
    ExpirySweeper::start(store, ExpiryConfig::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn test_next_interval() {
        let config = ExpiryConfig::default();
        let base = config.base_interval;

        // Nothing stored or nothing removed: back off
        assert_eq!(next_interval(base, 0, 0, &config), base * 2);
        assert_eq!(next_interval(base, 0, 100, &config), base * 2);
        assert_eq!(
            next_interval(config.max_interval, 0, 100, &config),
            config.max_interval
        );

        // Half the keys expired: speed up
        assert_eq!(next_interval(base, 50, 100, &config), base / 2);
        assert_eq!(
            next_interval(config.min_interval, 50, 100, &config),
            config.min_interval
        );

        // A few expired: hold steady
        assert_eq!(next_interval(base, 5, 100, &config), base);
    }

    #[tokio::test]
    async fn test_sweeper_purges_expired_keys() {
        let store = Arc::new(StringStore::new());

        for i in 0..10 {
            store
                .set_ex(
                    Bytes::from(format!("key{}", i)),
                    Bytes::from("value"),
                    Duration::from_millis(50),
                )
                .unwrap();
        }
        store.mset(vec![(Bytes::from("persistent"), Bytes::from("value"))]);

        assert_eq!(store.len(), 11);

        let config = ExpiryConfig {
            base_interval: Duration::from_millis(10),
            max_interval: Duration::from_millis(20),
            ..Default::default()
        };
        let _sweeper = ExpirySweeper::start(Arc::clone(&store), config);

        tokio::time::sleep(Duration::from_millis(200)).await;

        // Only the persistent key should remain, without anyone reading the others
        assert_eq!(store.len(), 1);
        assert_eq!(store.stats().expired, 10);
    }

    #[tokio::test]
    async fn test_sweeper_stops_on_drop() {
        let store = Arc::new(StringStore::new());

        let config = ExpiryConfig {
            base_interval: Duration::from_millis(10),
            ..Default::default()
        };

        {
            let _sweeper = ExpirySweeper::start(Arc::clone(&store), config);
            tokio::time::sleep(Duration::from_millis(50)).await;
        }

        store
            .set_ex(
                Bytes::from("key"),
                Bytes::from("value"),
                Duration::from_millis(10),
            )
            .unwrap();

        tokio::time::sleep(Duration::from_millis(100)).await;

        // Nobody purged it, but it still reads as absent
        assert_eq!(store.len(), 1);
        assert!(store.get(&Bytes::from("key")).is_none());
        assert_eq!(store.len(), 0);
    }
}
