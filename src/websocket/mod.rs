use axum::extract::ws::Message;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{
    mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender},
    RwLock,
};
use uuid::Uuid;

pub mod events;
pub mod handlers;
pub mod pubsub;

pub use events::{ChangeEvent, ChangeType, ChangedTable};

/// Live sockets keyed by viewer. Keying by viewer (rather than by
/// conversation) makes the per-viewer filter structural: an event is only
/// ever handed to the participants it was addressed to.
#[derive(Default, Clone)]
pub struct ConnectionRegistry {
    inner: Arc<RwLock<HashMap<Uuid, Vec<UnboundedSender<Message>>>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn subscribe(&self, viewer: Uuid) -> UnboundedReceiver<Message> {
        let (tx, rx) = unbounded_channel();
        let mut guard = self.inner.write().await;
        guard.entry(viewer).or_default().push(tx);
        rx
    }

    /// Deliver to every live session of one viewer, dropping senders whose
    /// receiving socket has gone away.
    pub async fn deliver(&self, viewer: Uuid, msg: Message) {
        let mut guard = self.inner.write().await;
        if let Some(list) = guard.get_mut(&viewer) {
            list.retain(|sender| sender.send(msg.clone()).is_ok());
            if list.is_empty() {
                guard.remove(&viewer);
            }
        }
    }

    /// Drop senders whose receiving side has gone away. Called eagerly when
    /// a socket task exits, so a viewer who disconnects does not keep an
    /// entry alive until the next delivery happens to prune it.
    pub async fn unsubscribe(&self, viewer: Uuid) {
        let mut guard = self.inner.write().await;
        if let Some(list) = guard.get_mut(&viewer) {
            list.retain(|sender| !sender.is_closed());
            if list.is_empty() {
                guard.remove(&viewer);
            }
        }
    }

    pub async fn session_count(&self, viewer: Uuid) -> usize {
        self.inner
            .read()
            .await
            .get(&viewer)
            .map(|l| l.len())
            .unwrap_or(0)
    }
}

/// Pushes level-triggered change notifications to the participants of a
/// conversation: locally through the registry and, when a Redis client is
/// configured, across instances through pub/sub. The stores remain the
/// source of truth; a lost or duplicated event costs nothing beyond a
/// redundant re-pull.
#[derive(Clone)]
pub struct RealtimeNotifier {
    registry: ConnectionRegistry,
    redis: Option<redis::Client>,
}

impl RealtimeNotifier {
    pub fn new(registry: ConnectionRegistry, redis: Option<redis::Client>) -> Self {
        Self { registry, redis }
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    pub async fn notify(&self, participants: &[Uuid], event: &ChangeEvent) {
        let payload = match serde_json::to_string(event) {
            Ok(p) => p,
            Err(e) => {
                tracing::error!(error = %e, "failed to serialize change event");
                return;
            }
        };
        for viewer in participants {
            self.registry
                .deliver(*viewer, Message::Text(payload.clone()))
                .await;
            if let Some(client) = &self.redis {
                if let Err(e) = pubsub::publish(client, *viewer, &payload).await {
                    tracing::warn!(error = %e, %viewer, "redis publish failed");
                }
            }
        }
    }
}
