use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Attachment, Message, MessageType};
use crate::services::conversation_service::ConversationService;

const PREVIEW_MAX_CHARS: usize = 120;

pub struct MessageService;

impl MessageService {
    /// Append a message to a conversation. The insert and the
    /// conversation's last-message summary update share one transaction,
    /// so the summary can never lag behind an existing message.
    pub async fn append(
        db: &Pool<Postgres>,
        conversation_id: Uuid,
        sender_id: Uuid,
        body: Option<String>,
        attachment: Option<Attachment>,
    ) -> AppResult<Message> {
        ConversationService::require_participant(db, conversation_id, sender_id).await?;

        let body = body.unwrap_or_default().trim().to_string();
        if body.is_empty() && attachment.is_none() {
            return Err(AppError::Validation(
                "message must carry a body or an attachment".into(),
            ));
        }

        let message_type = MessageType::derive(attachment.as_ref());
        let preview = Self::preview(
            &body,
            message_type,
            attachment.as_ref().map(|a| a.filename.as_str()),
        );
        let id = Uuid::new_v4();

        let mut tx = db.begin().await?;

        let row = sqlx::query(
            "INSERT INTO messages \
               (id, conversation_id, sender_id, body, message_type, \
                attachment_url, attachment_name, attachment_mime, attachment_size) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING created_at",
        )
        .bind(id)
        .bind(conversation_id)
        .bind(sender_id)
        .bind(&body)
        .bind(message_type.as_str())
        .bind(attachment.as_ref().map(|a| a.url.as_str()))
        .bind(attachment.as_ref().map(|a| a.filename.as_str()))
        .bind(attachment.as_ref().map(|a| a.mime.as_str()))
        .bind(attachment.as_ref().map(|a| a.size_bytes))
        .fetch_one(&mut *tx)
        .await?;
        let created_at: chrono::DateTime<chrono::Utc> = row.get("created_at");

        sqlx::query(
            "UPDATE conversations SET last_message_preview = $2, last_message_at = $3 \
             WHERE id = $1",
        )
        .bind(conversation_id)
        .bind(&preview)
        .bind(created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Message {
            id,
            conversation_id,
            sender_id,
            body,
            message_type,
            attachment,
            created_at,
            is_read: false,
        })
    }

    /// Non-deleted messages of a conversation, ascending by created_at with
    /// insertion order breaking ties. Participants only.
    pub async fn list(
        db: &Pool<Postgres>,
        conversation_id: Uuid,
        requester: Uuid,
    ) -> AppResult<Vec<Message>> {
        ConversationService::require_participant(db, conversation_id, requester).await?;

        let rows = sqlx::query(
            "SELECT id, sender_id, body, message_type, \
                    attachment_url, attachment_name, attachment_mime, attachment_size, \
                    created_at, is_read \
             FROM messages \
             WHERE conversation_id = $1 AND deleted_at IS NULL \
             ORDER BY created_at ASC, seq ASC",
        )
        .bind(conversation_id)
        .fetch_all(db)
        .await?;

        let messages = rows
            .into_iter()
            .map(|row| {
                let message_type: String = row.get("message_type");
                let attachment_url: Option<String> = row.get("attachment_url");
                let attachment = attachment_url.map(|url| Attachment {
                    url,
                    filename: row
                        .get::<Option<String>, _>("attachment_name")
                        .unwrap_or_default(),
                    mime: row
                        .get::<Option<String>, _>("attachment_mime")
                        .unwrap_or_default(),
                    size_bytes: row.get::<Option<i64>, _>("attachment_size").unwrap_or(0),
                });
                Message {
                    id: row.get("id"),
                    conversation_id,
                    sender_id: row.get("sender_id"),
                    body: row.get("body"),
                    message_type: MessageType::from_str(&message_type),
                    attachment,
                    created_at: row.get("created_at"),
                    is_read: row.get("is_read"),
                }
            })
            .collect();

        Ok(messages)
    }

    /// Soft-delete a message. Sender only; the row stays in the table but
    /// disappears from listings, unread counting and the conversation
    /// summary. Returns the owning conversation id so the caller can emit
    /// a change event.
    pub async fn soft_delete(
        db: &Pool<Postgres>,
        message_id: Uuid,
        requester: Uuid,
    ) -> AppResult<Uuid> {
        let row = sqlx::query(
            "SELECT conversation_id, sender_id, deleted_at FROM messages WHERE id = $1",
        )
        .bind(message_id)
        .fetch_optional(db)
        .await?
        .ok_or(AppError::NotFound)?;

        let conversation_id: Uuid = row.get("conversation_id");
        let sender_id: Uuid = row.get("sender_id");
        let deleted_at: Option<chrono::DateTime<chrono::Utc>> = row.get("deleted_at");

        // An already-deleted message is treated as absent.
        if deleted_at.is_some() {
            return Err(AppError::NotFound);
        }
        if sender_id != requester {
            return Err(AppError::Forbidden);
        }

        let mut tx = db.begin().await?;

        sqlx::query("UPDATE messages SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL")
            .bind(message_id)
            .execute(&mut *tx)
            .await?;

        // Deleting the newest message must not leave its body in the
        // conversation summary; recompute from the surviving tail.
        let tail = sqlx::query(
            "SELECT body, message_type, attachment_name, created_at \
             FROM messages \
             WHERE conversation_id = $1 AND deleted_at IS NULL \
             ORDER BY created_at DESC, seq DESC \
             LIMIT 1",
        )
        .bind(conversation_id)
        .fetch_optional(&mut *tx)
        .await?;

        let (preview, last_at) = match tail {
            Some(row) => {
                let body: String = row.get("body");
                let message_type: String = row.get("message_type");
                let attachment_name: Option<String> = row.get("attachment_name");
                let preview = Self::preview(
                    &body,
                    MessageType::from_str(&message_type),
                    attachment_name.as_deref(),
                );
                let created_at: chrono::DateTime<chrono::Utc> = row.get("created_at");
                (Some(preview), Some(created_at))
            }
            None => (None, None),
        };

        sqlx::query(
            "UPDATE conversations SET last_message_preview = $2, last_message_at = $3 \
             WHERE id = $1",
        )
        .bind(conversation_id)
        .bind(preview)
        .bind(last_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(conversation_id)
    }

    fn preview(body: &str, message_type: MessageType, attachment_name: Option<&str>) -> String {
        if !body.is_empty() {
            return body.chars().take(PREVIEW_MAX_CHARS).collect();
        }
        match message_type {
            MessageType::Image => "[image]".to_string(),
            _ => attachment_name
                .map(|name| format!("[file] {name}"))
                .unwrap_or_default(),
        }
    }
}
