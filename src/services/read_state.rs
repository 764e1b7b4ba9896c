use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::conversation_service::ConversationService;

pub struct ReadStateTracker;

impl ReadStateTracker {
    /// Flip every unread message from the other participant to read. Bulk
    /// conditional update: idempotent, and commutative under concurrent
    /// invocation by the same viewer. Returns the number of rows flipped.
    pub async fn mark_read(
        db: &Pool<Postgres>,
        conversation_id: Uuid,
        viewer: Uuid,
    ) -> AppResult<u64> {
        ConversationService::require_participant(db, conversation_id, viewer).await?;

        let result = sqlx::query(
            "UPDATE messages SET is_read = TRUE \
             WHERE conversation_id = $1 AND sender_id <> $2 \
               AND NOT is_read AND deleted_at IS NULL",
        )
        .bind(conversation_id)
        .bind(viewer)
        .execute(db)
        .await?;

        Ok(result.rows_affected())
    }

    /// Unread messages addressed to the viewer in one conversation.
    /// Computed fresh on every call, never cached across requests.
    pub async fn unread_count(
        db: &Pool<Postgres>,
        conversation_id: Uuid,
        viewer: Uuid,
    ) -> AppResult<i64> {
        ConversationService::require_participant(db, conversation_id, viewer).await?;

        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM messages \
             WHERE conversation_id = $1 AND sender_id <> $2 \
               AND NOT is_read AND deleted_at IS NULL",
        )
        .bind(conversation_id)
        .bind(viewer)
        .fetch_one(db)
        .await?;

        Ok(count)
    }

    /// Unread total across every conversation the viewer participates in,
    /// feeding the global "has unread" indicator.
    pub async fn total_unread(db: &Pool<Postgres>, viewer: Uuid) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM messages m \
             JOIN conversations c ON c.id = m.conversation_id \
             WHERE (c.user_low = $1 OR c.user_high = $1) \
               AND m.sender_id <> $1 AND NOT m.is_read AND m.deleted_at IS NULL",
        )
        .bind(viewer)
        .fetch_one(db)
        .await?;

        Ok(count)
    }
}
