//! Periodic inactivity sweep.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::tracker::PresenceTracker;

/// Background task running [`PresenceTracker::sweep_once`] on an interval.
#[derive(Debug)]
pub struct PresenceSweeper {
    tracker: Arc<PresenceTracker>,
    interval: Duration,
}

impl PresenceSweeper {
    /// Create a sweeper running every `interval`.
    pub fn new(tracker: Arc<PresenceTracker>, interval: Duration) -> Self {
        Self { tracker, interval }
    }

    /// Spawn the sweep loop; it stops when `shutdown` is cancelled.
    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    /// Run the sweep loop until `shutdown` is cancelled.
    pub async fn run(self, shutdown: CancellationToken) {
        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        info!(interval_secs = self.interval.as_secs(), "Presence sweeper started");
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    let swept = self.tracker.sweep_once();
                    if swept.is_empty() {
                        debug!("Presence sweep found no stale users");
                    } else {
                        info!(count = swept.len(), "Presence sweep marked users offline");
                    }
                }
            }
        }
        info!("Presence sweeper stopped");
    }
}
