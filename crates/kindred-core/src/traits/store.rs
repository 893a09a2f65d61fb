//! Persistent store access needed by the gateway.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::result::AppResult;
use crate::types::{ConversationId, UserId};

/// The slice of the relational store the gateway reads and writes.
#[async_trait]
pub trait ActivityStore: Send + Sync + std::fmt::Debug + 'static {
    /// Persist the time a user was last seen active.
    async fn set_last_active(&self, user_id: UserId, at: DateTime<Utc>) -> AppResult<()>;

    /// List the participants of a conversation.
    ///
    /// Returns an empty list for an unknown conversation.
    async fn conversation_members(&self, conversation_id: ConversationId)
    -> AppResult<Vec<UserId>>;
}
