use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tracing::warn;
use uuid::Uuid;

use crate::middleware::auth::verify_jwt;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct WsParams {
    pub token: Option<String>,
}

/// Browsers cannot set headers on a websocket upgrade, so the token also
/// travels as a query parameter.
fn bearer_token(params: &WsParams, headers: &HeaderMap) -> Option<String> {
    params.token.clone().or_else(|| {
        headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.strip_prefix("Bearer "))
            .map(|s| s.to_string())
    })
}

pub async fn ws_handler(
    State(state): State<AppState>,
    Query(params): Query<WsParams>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let Some(token) = bearer_token(&params, &headers) else {
        return StatusCode::UNAUTHORIZED.into_response();
    };
    let viewer = match verify_jwt(&state.config.jwt_secret, &token) {
        Ok(claims) => match Uuid::parse_str(&claims.sub) {
            Ok(id) => id,
            Err(_) => return StatusCode::UNAUTHORIZED.into_response(),
        },
        Err(_) => {
            warn!("websocket upgrade rejected: invalid token");
            return StatusCode::UNAUTHORIZED.into_response();
        }
    };

    ws.on_upgrade(move |socket| handle_socket(state, viewer, socket))
}

/// Session-long subscription. The receiver is registered before anything
/// else, events are forwarded until either side closes, and the registry
/// entry is cleared on exit: no replay obligation survives it.
async fn handle_socket(state: AppState, viewer: Uuid, socket: WebSocket) {
    let registry = state.notifier.registry().clone();
    let mut rx = registry.subscribe(viewer).await;
    let (mut sender, mut receiver) = socket.split();

    loop {
        tokio::select! {
            maybe = rx.recv() => {
                match maybe {
                    Some(msg) => {
                        if sender.send(msg).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
            incoming = receiver.next() => {
                match incoming {
                    // Inbound traffic is ignored: the stream is push-only
                    // and clients mutate state over HTTP.
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(_)) => break,
                }
            }
        }
    }

    drop(rx);
    registry.unsubscribe(viewer).await;
}
