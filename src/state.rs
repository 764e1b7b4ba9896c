use crate::{
    config::Config, services::directory_service::ContactPolicy, storage::BlobStore,
    websocket::RealtimeNotifier,
};
use sqlx::{Pool, Postgres};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: Pool<Postgres>,
    pub notifier: RealtimeNotifier,
    pub blobs: Arc<dyn BlobStore>,
    pub contacts: Arc<dyn ContactPolicy>,
    pub config: Arc<Config>,
}
