use crate::state::AppState;
use axum::extract::DefaultBodyLimit;
use axum::{
    middleware,
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::json;

pub mod attachments;
pub mod contacts;
pub mod conversations;
pub mod messages;

use attachments::upload_attachment;
use contacts::list_contacts;
use conversations::{get_or_create_conversation, list_conversations, mark_read};
use messages::{delete_message, list_messages, send_message};

async fn healthz() -> Json<serde_json::Value> {
    Json(json!({"status": "ok"}))
}

/// Full application router. Introspection stays public; the websocket
/// endpoint authenticates itself at upgrade time; everything else sits
/// behind the bearer-token middleware.
pub fn build_router(state: AppState) -> Router {
    // Body limit well above the attachment cap so an oversize payload
    // reaches the validator and fails with the taxonomy's ValidationError,
    // not a framework 413.
    let body_limit = state.config.max_attachment_bytes as usize * 4;

    let api_v1 = Router::new()
        .route("/conversations", post(get_or_create_conversation))
        .route("/conversations", get(list_conversations))
        .route("/conversations/:id/messages", post(send_message))
        .route("/conversations/:id/messages", get(list_messages))
        .route("/conversations/:id/read", post(mark_read))
        .route("/messages/:id", delete(delete_message))
        .route(
            "/attachments",
            post(upload_attachment).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/contacts", get(list_contacts))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            crate::middleware::auth::auth_middleware,
        ))
        .route("/ws", get(crate::websocket::handlers::ws_handler));

    let introspection = Router::new().route("/healthz", get(healthz));

    let router = introspection
        .merge(Router::new().nest("/api/v1", api_v1))
        .with_state(state);

    crate::middleware::logging::add_tracing(router)
}
