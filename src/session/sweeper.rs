//! Background eviction of stale pending uploads.

use std::sync::Arc;

use tokio::time::{interval, Duration};
use tracing::{debug, info};

use super::store::SessionStore;

/// Default sweep interval in seconds.
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;

/// Periodically drops pending uploads that outlived the store's TTL.
pub struct PendingSweeper {
    store: Arc<SessionStore>,
    sweep_interval: Duration,
}

impl PendingSweeper {
    /// Create a sweeper with the default interval.
    pub fn new(store: Arc<SessionStore>) -> Self {
        Self::with_interval(store, DEFAULT_SWEEP_INTERVAL_SECS)
    }

    /// Create a sweeper with a custom interval.
    pub fn with_interval(store: Arc<SessionStore>, interval_secs: u64) -> Self {
        Self {
            store,
            sweep_interval: Duration::from_secs(interval_secs.max(1)),
        }
    }

    /// Run the sweep loop forever.
    pub async fn run(&self) {
        info!(
            "Pending upload sweeper started (interval: {} seconds, ttl: {} seconds)",
            self.sweep_interval.as_secs(),
            self.store.pending_ttl().as_secs()
        );

        let mut timer = interval(self.sweep_interval);

        loop {
            timer.tick().await;
            self.sweep_once().await;
        }
    }

    /// Run a single sweep. Returns the number of evicted uploads.
    pub async fn sweep_once(&self) -> usize {
        let evicted = self.store.evict_expired().await;
        if evicted > 0 {
            info!("Evicted {} expired pending upload(s)", evicted);
        } else {
            debug!("No expired pending uploads");
        }
        evicted
    }
}
