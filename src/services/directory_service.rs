use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::contact::{Contact, DirectoryEntry};
use crate::models::conversation::ConversationSummary;
use crate::services::conversation_service::ConversationService;

/// External role-visibility collaborator: decides which users a viewer may
/// message. The chat core consumes the eligible set and never interprets
/// roles itself.
#[async_trait]
pub trait ContactPolicy: Send + Sync {
    async fn eligible_contacts(&self, db: &Pool<Postgres>, viewer: Uuid)
        -> AppResult<Vec<Contact>>;
}

/// Default policy of the surrounding admin system: administrative roles may
/// contact everyone, everyone else may contact administrative roles.
pub struct RoleVisibilityPolicy;

const ADMIN_ROLES: &[&str] = &["admin", "staff", "teacher"];

#[async_trait]
impl ContactPolicy for RoleVisibilityPolicy {
    async fn eligible_contacts(
        &self,
        db: &Pool<Postgres>,
        viewer: Uuid,
    ) -> AppResult<Vec<Contact>> {
        let viewer_role: Option<String> =
            sqlx::query_scalar("SELECT role FROM users WHERE id = $1")
                .bind(viewer)
                .fetch_optional(db)
                .await?;
        let sees_everyone = viewer_role
            .as_deref()
            .map(|r| ADMIN_ROLES.contains(&r))
            .unwrap_or(false);

        let rows = sqlx::query(
            "SELECT id, display_name, username, role FROM users \
             WHERE id <> $1 AND ($2 OR role = ANY($3)) \
             ORDER BY COALESCE(display_name, username) ASC",
        )
        .bind(viewer)
        .bind(sees_everyone)
        .bind(ADMIN_ROLES)
        .fetch_all(db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let display_name: Option<String> = row.get("display_name");
                let username: String = row.get("username");
                Contact {
                    user_id: row.get("id"),
                    display_name: display_name.unwrap_or(username),
                    role: row.get("role"),
                }
            })
            .collect())
    }
}

pub struct DirectoryService;

impl DirectoryService {
    /// Contacts the viewer may message, each annotated with whether a
    /// conversation already exists. The annotation is derived presentation
    /// state computed over two freshly fetched lists, never persisted.
    pub async fn list_contacts(
        db: &Pool<Postgres>,
        policy: &dyn ContactPolicy,
        viewer: Uuid,
    ) -> AppResult<Vec<DirectoryEntry>> {
        let contacts = policy.eligible_contacts(db, viewer).await?;
        let conversations = ConversationService::list_for_user(db, viewer).await?;
        Ok(Self::annotate(contacts, &conversations))
    }

    fn annotate(contacts: Vec<Contact>, conversations: &[ConversationSummary]) -> Vec<DirectoryEntry> {
        contacts
            .into_iter()
            .map(|c| {
                let has_conversation = conversations
                    .iter()
                    .any(|conv| conv.other_user_id == c.user_id);
                DirectoryEntry {
                    user_id: c.user_id,
                    display_name: c.display_name,
                    role: c.role,
                    has_conversation,
                }
            })
            .collect()
    }
}
