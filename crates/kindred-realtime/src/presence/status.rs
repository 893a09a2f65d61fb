//! Per-user presence record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use kindred_core::types::UserId;

/// What the tracker remembers about one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserPresence {
    /// Most recent activity.
    pub last_active: DateTime<Utc>,
    /// Status last broadcast for this user.
    pub online: bool,
}

impl UserPresence {
    /// A user seen active at `now`, not yet announced.
    pub fn seen_at(now: DateTime<Utc>) -> Self {
        Self {
            last_active: now,
            online: false,
        }
    }

    /// Whether the user has been silent for longer than `threshold`.
    pub fn is_stale(&self, now: DateTime<Utc>, threshold: chrono::Duration) -> bool {
        now - self.last_active > threshold
    }
}

/// Presence of one user as reported to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceStatus {
    /// User ID
    pub user_id: UserId,
    /// Online right now
    pub is_online: bool,
    /// Last activity seen by this gateway, if any
    pub last_active: Option<DateTime<Utc>>,
}
