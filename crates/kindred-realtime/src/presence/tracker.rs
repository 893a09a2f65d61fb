//! Presence tracker: edge-triggered online/offline state per user.
//!
//! All transitions happen under one lock and their `status.changed`
//! broadcasts are enqueued before it is released, so observers see a user's
//! transitions in the order they happened.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

use kindred_core::clock::Clock;
use kindred_core::config::PresenceConfig;
use kindred_core::traits::ActivityStore;
use kindred_core::types::UserId;

use super::status::{PresenceStatus, UserPresence};
use crate::connection::registry::ConnectionRegistry;
use crate::message::types::ServerEvent;
use crate::metrics::GatewayMetrics;
use crate::room::router::RoomRouter;

/// Tracks presence state for all users with a live binding.
#[derive(Debug)]
pub struct PresenceTracker {
    users: Mutex<HashMap<UserId, UserPresence>>,
    registry: Arc<ConnectionRegistry>,
    router: Arc<RoomRouter>,
    store: Arc<dyn ActivityStore>,
    clock: Arc<dyn Clock>,
    threshold: chrono::Duration,
    metrics: Arc<GatewayMetrics>,
}

impl PresenceTracker {
    /// Create a new presence tracker
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        router: Arc<RoomRouter>,
        store: Arc<dyn ActivityStore>,
        clock: Arc<dyn Clock>,
        config: &PresenceConfig,
        metrics: Arc<GatewayMetrics>,
    ) -> Self {
        let threshold = chrono::Duration::from_std(config.inactivity_threshold())
            .unwrap_or(chrono::Duration::MAX);
        Self {
            users: Mutex::new(HashMap::new()),
            registry,
            router,
            store,
            clock,
            threshold,
            metrics,
        }
    }

    /// Record activity for a user.
    ///
    /// Broadcasts `status.changed{online}` only when the user was not already
    /// online. Users without a bound connection are ignored. Returns whether
    /// a transition happened.
    pub fn touch(&self, user_id: UserId) -> bool {
        let now = self.clock.now();
        let mut users = self.users.lock();
        if !self.registry.has_connections(user_id) {
            return false;
        }

        let presence = users
            .entry(user_id)
            .or_insert_with(|| UserPresence::seen_at(now));
        presence.last_active = now;
        if presence.online {
            return false;
        }
        presence.online = true;
        self.announce(user_id, true, now);
        true
    }

    /// Called after a connection of `user_id` was unbound.
    ///
    /// If it was the user's last connection the user goes offline, their
    /// record is dropped, and the final activity time is persisted.
    /// Returns whether a transition happened.
    pub fn connection_closed(&self, user_id: UserId) -> bool {
        let now = self.clock.now();
        let mut users = self.users.lock();
        if self.registry.has_connections(user_id) {
            return false;
        }
        let Some(presence) = users.remove(&user_id) else {
            return false;
        };
        if !presence.online {
            return false;
        }
        self.announce(user_id, false, now);
        self.persist(user_id, presence.last_active);
        true
    }

    /// Force offline every online user silent for longer than the threshold.
    ///
    /// Bindings are left alone: the next activity on a still-open connection
    /// brings the user back online. Returns the users that went offline.
    pub fn sweep_once(&self) -> Vec<UserId> {
        let now = self.clock.now();
        let mut swept = Vec::new();

        let mut users = self.users.lock();
        users.retain(|user_id, presence| {
            if presence.online && presence.is_stale(now, self.threshold) {
                presence.online = false;
                swept.push((*user_id, presence.last_active));
            }
            presence.online || self.registry.has_connections(*user_id)
        });
        for (user_id, last_active) in &swept {
            self.announce(*user_id, false, now);
            self.persist(*user_id, *last_active);
        }
        drop(users);

        self.metrics.record_sweep();
        swept.into_iter().map(|(user_id, _)| user_id).collect()
    }

    /// Whether the user has a bound connection and was active within the threshold.
    pub fn is_online(&self, user_id: UserId) -> bool {
        let now = self.clock.now();
        let users = self.users.lock();
        users
            .get(&user_id)
            .is_some_and(|p| !p.is_stale(now, self.threshold))
            && self.registry.has_connections(user_id)
    }

    /// Online flags for a batch of users; unknown users are offline.
    pub fn bulk_status(&self, user_ids: &[UserId]) -> HashMap<UserId, bool> {
        user_ids
            .iter()
            .map(|user_id| (*user_id, self.is_online(*user_id)))
            .collect()
    }

    /// Full presence record for one user.
    pub fn status(&self, user_id: UserId) -> PresenceStatus {
        let last_active = self.users.lock().get(&user_id).map(|p| p.last_active);
        PresenceStatus {
            user_id,
            is_online: self.is_online(user_id),
            last_active,
        }
    }

    /// Number of users whose last broadcast status is online.
    pub fn online_count(&self) -> usize {
        self.users.lock().values().filter(|p| p.online).count()
    }

    fn announce(&self, user_id: UserId, is_online: bool, at: DateTime<Utc>) {
        let report = self.router.broadcast(ServerEvent::StatusChanged {
            user_id,
            is_online,
            timestamp: at,
        });
        self.metrics.record_presence_transition();
        info!(
            user_id = %user_id,
            is_online,
            recipients = report.delivered,
            "Presence changed"
        );
    }

    /// Fire-and-forget write of the last activity time.
    fn persist(&self, user_id: UserId, at: DateTime<Utc>) {
        let Ok(runtime) = Handle::try_current() else {
            warn!(user_id = %user_id, "No async runtime, last activity not persisted");
            return;
        };
        let store = Arc::clone(&self.store);
        let metrics = Arc::clone(&self.metrics);
        runtime.spawn(async move {
            match store.set_last_active(user_id, at).await {
                Ok(()) => debug!(user_id = %user_id, at = %at, "Persisted last activity"),
                Err(e) => {
                    metrics.record_persist_failure();
                    warn!(user_id = %user_id, error = %e, "Failed to persist last activity");
                }
            }
        });
    }
}
