use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangedTable {
    Conversations,
    Messages,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    Insert,
    Update,
}

/// Level-triggered change notification. It carries no payload beyond
/// "something touching this conversation changed"; the receiving client
/// re-pulls the affected message list and the conversation list, so state
/// is always re-derived from the stores and never assembled from the
/// stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub table: ChangedTable,
    pub change: ChangeType,
    pub conversation_id: Uuid,
}

impl ChangeEvent {
    pub fn conversation_created(conversation_id: Uuid) -> Self {
        Self {
            table: ChangedTable::Conversations,
            change: ChangeType::Insert,
            conversation_id,
        }
    }

    pub fn message_inserted(conversation_id: Uuid) -> Self {
        Self {
            table: ChangedTable::Messages,
            change: ChangeType::Insert,
            conversation_id,
        }
    }

    /// Read-state flips and soft deletes both surface as message updates.
    pub fn messages_updated(conversation_id: Uuid) -> Self {
        Self {
            table: ChangedTable::Messages,
            change: ChangeType::Update,
            conversation_id,
        }
    }
}
