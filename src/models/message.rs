use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Text,
    Image,
    File,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Text => "text",
            MessageType::Image => "image",
            MessageType::File => "file",
        }
    }

    pub fn from_str(value: &str) -> Self {
        match value {
            "image" => MessageType::Image,
            "file" => MessageType::File,
            _ => MessageType::Text,
        }
    }

    /// The type is derived from the payload, never client-supplied: an
    /// image mime yields an image message, any other attachment a file
    /// message, no attachment a text message.
    pub fn derive(attachment: Option<&Attachment>) -> Self {
        match attachment {
            Some(att) if att.mime.starts_with("image/") => MessageType::Image,
            Some(_) => MessageType::File,
            None => MessageType::Text,
        }
    }
}

/// Stable reference to a staged blob plus descriptive metadata. The blob is
/// uploaded before the owning message is appended; the reverse order is
/// never allowed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    pub url: String,
    pub filename: String,
    pub mime: String,
    pub size_bytes: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    pub body: String,
    #[serde(rename = "type")]
    pub message_type: MessageType,
    pub attachment: Option<Attachment>,
    pub created_at: DateTime<Utc>,
    pub is_read: bool,
}
