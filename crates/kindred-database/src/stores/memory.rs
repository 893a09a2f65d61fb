//! In-memory activity store for single-node runs without a database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use kindred_core::result::AppResult;
use kindred_core::traits::ActivityStore;
use kindred_core::types::{ConversationId, UserId};

/// Activity store held entirely in process memory.
#[derive(Debug, Default)]
pub struct MemoryActivityStore {
    /// User ID → last persisted activity time.
    last_active: DashMap<UserId, DateTime<Utc>>,
    /// Conversation ID → participants.
    conversations: DashMap<ConversationId, Vec<UserId>>,
}

impl MemoryActivityStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a conversation and its participants.
    pub fn add_conversation(&self, conversation_id: ConversationId, members: Vec<UserId>) {
        self.conversations.insert(conversation_id, members);
    }

    /// Last persisted activity time for a user.
    pub fn last_active(&self, user_id: UserId) -> Option<DateTime<Utc>> {
        self.last_active.get(&user_id).map(|r| *r.value())
    }
}

#[async_trait]
impl ActivityStore for MemoryActivityStore {
    async fn set_last_active(&self, user_id: UserId, at: DateTime<Utc>) -> AppResult<()> {
        self.last_active
            .entry(user_id)
            .and_modify(|current| {
                if *current < at {
                    *current = at;
                }
            })
            .or_insert(at);
        Ok(())
    }

    async fn conversation_members(
        &self,
        conversation_id: ConversationId,
    ) -> AppResult<Vec<UserId>> {
        Ok(self
            .conversations
            .get(&conversation_id)
            .map(|r| r.value().clone())
            .unwrap_or_default())
    }
}
