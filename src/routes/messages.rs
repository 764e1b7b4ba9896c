use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::middleware::auth::Viewer;
use crate::models::{Attachment, Message};
use crate::services::{
    conversation_service::ConversationService, message_service::MessageService,
};
use crate::state::AppState;
use crate::websocket::ChangeEvent;

#[derive(Deserialize)]
pub struct SendMessageRequest {
    pub body: Option<String>,
    /// Reference returned by the attachment staging endpoint; staging must
    /// have succeeded before this request is made.
    pub attachment: Option<Attachment>,
}

/// POST /conversations/:id/messages
pub async fn send_message(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(conversation_id): Path<Uuid>,
    Json(body): Json<SendMessageRequest>,
) -> Result<Json<Message>, crate::error::AppError> {
    let conv = ConversationService::require_participant(&state.db, conversation_id, viewer.id)
        .await?;
    let message = MessageService::append(
        &state.db,
        conversation_id,
        viewer.id,
        body.body,
        body.attachment,
    )
    .await?;
    state
        .notifier
        .notify(
            &[conv.user_low, conv.user_high],
            &ChangeEvent::message_inserted(conversation_id),
        )
        .await;
    Ok(Json(message))
}

/// GET /conversations/:id/messages — ascending by created_at, insertion
/// order breaking ties; soft-deleted rows excluded.
pub async fn list_messages(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(conversation_id): Path<Uuid>,
) -> Result<Json<Vec<Message>>, crate::error::AppError> {
    let messages = MessageService::list(&state.db, conversation_id, viewer.id).await?;
    Ok(Json(messages))
}

/// DELETE /messages/:id — sender-only soft delete.
pub async fn delete_message(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(message_id): Path<Uuid>,
) -> Result<StatusCode, crate::error::AppError> {
    let conversation_id = MessageService::soft_delete(&state.db, message_id, viewer.id).await?;
    let conv = ConversationService::get(&state.db, conversation_id).await?;
    state
        .notifier
        .notify(
            &[conv.user_low, conv.user_high],
            &ChangeEvent::messages_updated(conversation_id),
        )
        .await;
    Ok(StatusCode::NO_CONTENT)
}
