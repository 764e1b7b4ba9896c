use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Shown in place of a participant whose user row cannot be resolved; the
/// conversation entry itself is still returned.
pub const PLACEHOLDER_DISPLAY_NAME: &str = "Unknown user";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Uuid,
    pub user_low: Uuid,
    pub user_high: Uuid,
    pub last_message_preview: Option<String>,
    pub last_message_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Conversation {
    pub fn other_participant(&self, viewer: Uuid) -> Uuid {
        if viewer == self.user_low {
            self.user_high
        } else {
            self.user_low
        }
    }
}

/// One entry of a viewer's conversation list: the conversation enriched
/// with the other participant's identity and a freshly computed unread
/// count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub id: Uuid,
    pub other_user_id: Uuid,
    pub other_display_name: String,
    pub last_message_preview: Option<String>,
    pub last_message_at: Option<DateTime<Utc>>,
    pub unread_count: i64,
}

/// Canonicalize an unordered participant pair so (a, b) and (b, a) map to
/// the same stored row. Equal ids are a malformed pair, rejected before any
/// query runs.
pub fn canonical_pair(a: Uuid, b: Uuid) -> Result<(Uuid, Uuid), crate::error::AppError> {
    if a == b {
        return Err(crate::error::AppError::Validation(
            "cannot open a conversation with yourself".into(),
        ));
    }
    if a < b {
        Ok((a, b))
    } else {
        Ok((b, a))
    }
}
