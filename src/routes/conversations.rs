use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::auth::Viewer;
use crate::models::conversation::ConversationSummary;
use crate::services::{
    conversation_service::ConversationService, read_state::ReadStateTracker,
};
use crate::state::AppState;
use crate::websocket::ChangeEvent;

#[derive(Deserialize)]
pub struct GetOrCreateConversationRequest {
    pub other_user: Uuid,
}

#[derive(Serialize)]
pub struct ConversationIdResponse {
    pub id: Uuid,
}

#[derive(Serialize)]
pub struct ConversationListResponse {
    pub conversations: Vec<ConversationSummary>,
    pub total_unread: i64,
}

/// POST /conversations — idempotent get-or-create for the viewer and one
/// other user. Both orders of the pair converge on the same id.
pub async fn get_or_create_conversation(
    State(state): State<AppState>,
    viewer: Viewer,
    Json(body): Json<GetOrCreateConversationRequest>,
) -> Result<Json<ConversationIdResponse>, crate::error::AppError> {
    let id = ConversationService::get_or_create(&state.db, viewer.id, body.other_user).await?;
    state
        .notifier
        .notify(
            &[viewer.id, body.other_user],
            &ChangeEvent::conversation_created(id),
        )
        .await;
    Ok(Json(ConversationIdResponse { id }))
}

/// GET /conversations — the viewer's conversation list, most recent first,
/// with per-entry unread counts and the global unread total.
pub async fn list_conversations(
    State(state): State<AppState>,
    viewer: Viewer,
) -> Result<Json<ConversationListResponse>, crate::error::AppError> {
    let conversations = ConversationService::list_for_user(&state.db, viewer.id).await?;
    let total_unread = conversations.iter().map(|c| c.unread_count).sum();
    Ok(Json(ConversationListResponse {
        conversations,
        total_unread,
    }))
}

/// POST /conversations/:id/read — flip every message from the other
/// participant to read. Idempotent; invoked when the viewer opens a
/// conversation.
pub async fn mark_read(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(conversation_id): Path<Uuid>,
) -> Result<StatusCode, crate::error::AppError> {
    let conv = ConversationService::require_participant(&state.db, conversation_id, viewer.id)
        .await?;
    let flipped = ReadStateTracker::mark_read(&state.db, conversation_id, viewer.id).await?;
    if flipped > 0 {
        state
            .notifier
            .notify(
                &[conv.user_low, conv.user_high],
                &ChangeEvent::messages_updated(conversation_id),
            )
            .await;
    }
    Ok(StatusCode::NO_CONTENT)
}
