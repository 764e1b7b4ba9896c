use axum::{
    body::Bytes,
    extract::{Query, State},
    http::HeaderMap,
    Json,
};
use serde::Deserialize;
use std::time::Duration;

use crate::error::AppError;
use crate::middleware::auth::Viewer;
use crate::models::Attachment;
use crate::services::attachment_service::AttachmentService;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct UploadParams {
    pub filename: String,
}

/// POST /attachments?filename=... with the raw payload as the request body
/// and the declared mime in Content-Type. Staging is strictly sequential
/// with sending: the returned reference is what a later send request
/// carries, and a failure here means no message is ever appended.
pub async fn upload_attachment(
    State(state): State<AppState>,
    viewer: Viewer,
    Query(params): Query<UploadParams>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Attachment>, AppError> {
    let declared_mime = headers
        .get(axum::http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Validation("missing content type".into()))?
        .to_string();

    let staged = AttachmentService::stage(
        state.blobs.as_ref(),
        state.config.max_attachment_bytes,
        Duration::from_secs(state.config.upload_timeout_secs),
        viewer.id,
        &params.filename,
        &declared_mime,
        body.to_vec(),
    )
    .await?;

    Ok(Json(staged))
}
