//! Cross-instance fanout over Redis pub/sub. Each instance publishes change
//! events to per-viewer channels and feeds received events into its local
//! registry; duplicates with the direct local delivery are harmless because
//! clients re-derive state from the stores.

use axum::extract::ws::Message;
use futures_util::StreamExt;
use redis::AsyncCommands;
use redis::Client;
use uuid::Uuid;

use crate::websocket::ConnectionRegistry;

fn channel_for_viewer(viewer: Uuid) -> String {
    format!("chat:user:{}", viewer)
}

pub async fn publish(client: &Client, viewer: Uuid, payload: &str) -> redis::RedisResult<()> {
    let mut conn = client.get_multiplexed_async_connection().await?;
    conn.publish::<_, _, ()>(channel_for_viewer(viewer), payload)
        .await
}

/// Long-running listener delivering remote-origin events to local sockets.
/// PubSub needs a dedicated connection, not a multiplexed one.
pub async fn start_psub_listener(
    client: Client,
    registry: ConnectionRegistry,
) -> redis::RedisResult<()> {
    let conn = client.get_async_connection().await?;
    let mut pubsub = conn.into_pubsub();
    pubsub.psubscribe("chat:user:*").await?;
    let mut stream = pubsub.on_message();
    while let Some(msg) = stream.next().await {
        let channel: String = msg.get_channel_name().into();
        let payload: String = msg.get_payload()?;
        if let Some(id_part) = channel.strip_prefix("chat:user:") {
            if let Ok(viewer) = Uuid::parse_str(id_part) {
                registry.deliver(viewer, Message::Text(payload.clone())).await;
            }
        }
    }
    Ok(())
}
