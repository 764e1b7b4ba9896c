use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::conversation::{
    canonical_pair, Conversation, ConversationSummary, PLACEHOLDER_DISPLAY_NAME,
};

pub struct ConversationService;

impl ConversationService {
    /// Resolve the conversation for an unordered pair, creating it if
    /// absent. The unique constraint on the canonical pair plus the no-op
    /// DO UPDATE make this a single atomic statement: concurrent callers
    /// for the same pair all receive the surviving row's id, and an
    /// existing pair is never an error.
    pub async fn get_or_create(db: &Pool<Postgres>, a: Uuid, b: Uuid) -> AppResult<Uuid> {
        let (low, high) = canonical_pair(a, b)?;
        let id: Uuid = sqlx::query_scalar(
            "INSERT INTO conversations (id, user_low, user_high) VALUES ($1, $2, $3) \
             ON CONFLICT (user_low, user_high) DO UPDATE SET user_low = EXCLUDED.user_low \
             RETURNING id",
        )
        .bind(Uuid::new_v4())
        .bind(low)
        .bind(high)
        .fetch_one(db)
        .await?;
        Ok(id)
    }

    pub async fn get(db: &Pool<Postgres>, id: Uuid) -> AppResult<Conversation> {
        let row = sqlx::query(
            "SELECT id, user_low, user_high, last_message_preview, last_message_at, created_at \
             FROM conversations WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or(AppError::NotFound)?;

        Ok(Conversation {
            id: row.get("id"),
            user_low: row.get("user_low"),
            user_high: row.get("user_high"),
            last_message_preview: row.get("last_message_preview"),
            last_message_at: row.get("last_message_at"),
            created_at: row.get("created_at"),
        })
    }

    /// Fetch the conversation and enforce that the actor belongs to it.
    /// NotFound for a missing conversation, Forbidden for an outsider.
    pub async fn require_participant(
        db: &Pool<Postgres>,
        conversation_id: Uuid,
        user_id: Uuid,
    ) -> AppResult<Conversation> {
        let conv = Self::get(db, conversation_id).await?;
        if conv.user_low != user_id && conv.user_high != user_id {
            return Err(AppError::Forbidden);
        }
        Ok(conv)
    }

    /// All conversations the viewer participates in, most recently active
    /// first (never-messaged last), each enriched with the other
    /// participant's identity and a freshly computed unread count. A
    /// missing user row degrades to a placeholder identity instead of
    /// dropping the entry.
    pub async fn list_for_user(
        db: &Pool<Postgres>,
        viewer: Uuid,
    ) -> AppResult<Vec<ConversationSummary>> {
        let rows = sqlx::query(
            r#"
            SELECT c.id,
                   CASE WHEN c.user_low = $1 THEN c.user_high ELSE c.user_low END AS other_user_id,
                   u.display_name,
                   u.username,
                   c.last_message_preview,
                   c.last_message_at,
                   (
                     SELECT COUNT(*) FROM messages m
                     WHERE m.conversation_id = c.id
                       AND m.sender_id <> $1
                       AND NOT m.is_read
                       AND m.deleted_at IS NULL
                   ) AS unread_count
            FROM conversations c
            LEFT JOIN users u
              ON u.id = CASE WHEN c.user_low = $1 THEN c.user_high ELSE c.user_low END
            WHERE c.user_low = $1 OR c.user_high = $1
            ORDER BY c.last_message_at DESC NULLS LAST, c.created_at DESC
            "#,
        )
        .bind(viewer)
        .fetch_all(db)
        .await?;

        let summaries = rows
            .into_iter()
            .map(|row| {
                let display_name: Option<String> = row.get("display_name");
                let username: Option<String> = row.get("username");
                ConversationSummary {
                    id: row.get("id"),
                    other_user_id: row.get("other_user_id"),
                    other_display_name: display_name
                        .or(username)
                        .unwrap_or_else(|| PLACEHOLDER_DISPLAY_NAME.to_string()),
                    last_message_preview: row.get("last_message_preview"),
                    last_message_at: row.get("last_message_at"),
                    unread_count: row.get("unread_count"),
                }
            })
            .collect();

        Ok(summaries)
    }
}
