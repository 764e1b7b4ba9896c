use axum::{extract::State, Json};

use crate::middleware::auth::Viewer;
use crate::models::contact::DirectoryEntry;
use crate::services::directory_service::DirectoryService;
use crate::state::AppState;

/// GET /contacts — users the viewer may message per the role-visibility
/// policy, annotated with whether a conversation already exists.
pub async fn list_contacts(
    State(state): State<AppState>,
    viewer: Viewer,
) -> Result<Json<Vec<DirectoryEntry>>, crate::error::AppError> {
    let entries =
        DirectoryService::list_contacts(&state.db, state.contacts.as_ref(), viewer.id).await?;
    Ok(Json(entries))
}
