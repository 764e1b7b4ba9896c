use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user the viewer may initiate a conversation with, per the external
/// role-visibility policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
    pub user_id: Uuid,
    pub display_name: String,
    pub role: String,
}

/// Directory entry: a contact annotated with whether a conversation with
/// the viewer already exists. The flag is a UI affordance only; creating a
/// conversation succeeds for any eligible pair regardless of it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryEntry {
    pub user_id: Uuid,
    pub display_name: String,
    pub role: String,
    pub has_conversation: bool,
}
