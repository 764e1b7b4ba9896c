use chat_service::{
    config, db, error, logging, routes,
    services::directory_service::RoleVisibilityPolicy,
    state::AppState,
    storage::{S3BlobStore, S3Config},
    websocket::{pubsub, ConnectionRegistry, RealtimeNotifier},
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), error::AppError> {
    logging::init_tracing();
    let cfg = Arc::new(config::Config::from_env()?);

    let db = db::init_pool(&cfg.database_url)
        .await
        .map_err(|e| error::AppError::StartServer(format!("db: {e}")))?;

    // Embedded migrations; schema drift is fatal at startup.
    db::MIGRATOR
        .run(&db)
        .await
        .map_err(|e| error::AppError::StartServer(format!("migrations: {e}")))?;

    let redis = redis::Client::open(cfg.redis_url.as_str())
        .map_err(|e| error::AppError::StartServer(format!("redis: {e}")))?;

    let registry = ConnectionRegistry::new();
    let notifier = RealtimeNotifier::new(registry.clone(), Some(redis.clone()));

    // Cross-instance fanout listener; local delivery works without it.
    tokio::spawn({
        let registry = registry.clone();
        async move {
            if let Err(e) = pubsub::start_psub_listener(redis, registry).await {
                tracing::error!(error = %e, "redis pubsub listener failed");
            }
        }
    });

    let blobs = Arc::new(S3BlobStore::new(S3Config::from_env()).await);

    let state = AppState {
        db,
        notifier,
        blobs,
        contacts: Arc::new(RoleVisibilityPolicy),
        config: cfg.clone(),
    };

    let app = routes::build_router(state);

    let bind_addr = format!("0.0.0.0:{}", cfg.port);
    tracing::info!(%bind_addr, "starting chat-service");

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| error::AppError::StartServer(e.to_string()))?;
    axum::serve(listener, app)
        .await
        .map_err(|e| error::AppError::StartServer(e.to_string()))?;

    Ok(())
}
