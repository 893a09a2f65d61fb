//! PostgreSQL-backed activity store.
//!
//! The tables belong to the CRUD service; the gateway only touches
//! `users.last_active_at` and reads `conversation_members`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use kindred_core::error::{AppError, ErrorKind};
use kindred_core::result::AppResult;
use kindred_core::traits::ActivityStore;
use kindred_core::types::{ConversationId, UserId};

/// Activity store over the shared PostgreSQL database.
#[derive(Debug, Clone)]
pub struct PgActivityStore {
    pool: PgPool,
}

impl PgActivityStore {
    /// Create a new store over an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ActivityStore for PgActivityStore {
    async fn set_last_active(&self, user_id: UserId, at: DateTime<Utc>) -> AppResult<()> {
        // Writes are spawned and may land out of order; keep the newest.
        sqlx::query(
            "UPDATE users SET last_active_at = $2 \
             WHERE id = $1 AND (last_active_at IS NULL OR last_active_at < $2)",
        )
        .bind(user_id.into_uuid())
        .bind(at)
        .execute(&self.pool)
        .await
        .map(|_| ())
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to update last_active_at", e)
        })
    }

    async fn conversation_members(
        &self,
        conversation_id: ConversationId,
    ) -> AppResult<Vec<UserId>> {
        sqlx::query_scalar::<_, Uuid>(
            "SELECT user_id FROM conversation_members WHERE conversation_id = $1",
        )
        .bind(conversation_id.into_uuid())
        .fetch_all(&self.pool)
        .await
        .map(|ids| ids.into_iter().map(UserId::from).collect())
        .map_err(|e| {
            AppError::with_source(
                ErrorKind::Database,
                "Failed to load conversation members",
                e,
            )
        })
    }
}
