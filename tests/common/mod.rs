use chat_service::{
    config::Config,
    routes,
    services::directory_service::RoleVisibilityPolicy,
    state::AppState,
    storage::MemoryBlobStore,
    websocket::{ConnectionRegistry, RealtimeNotifier},
};
use jsonwebtoken::{encode, EncodingKey, Header};
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use std::sync::Arc;
use uuid::Uuid;

#[allow(dead_code)]
pub const TEST_JWT_SECRET: &str = "test-secret";

/// Integration tests need a reachable Postgres; without DATABASE_URL they
/// skip instead of failing, like on a laptop without the compose stack.
#[allow(dead_code)]
pub async fn try_pool() -> Option<Pool<Postgres>> {
    let url = std::env::var("DATABASE_URL").ok()?;
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await
        .ok()?;
    chat_service::db::MIGRATOR.run(&pool).await.ok()?;
    Some(pool)
}

#[allow(dead_code)]
pub async fn insert_user(pool: &Pool<Postgres>, name: &str, role: &str) -> Uuid {
    let id = Uuid::new_v4();
    // Unique username per run; the users table is shared between tests.
    let username = format!("{name}_{}", id.simple());
    sqlx::query("INSERT INTO users (id, username, display_name, role) VALUES ($1, $2, $3, $4)")
        .bind(id)
        .bind(&username)
        .bind(name)
        .bind(role)
        .execute(pool)
        .await
        .unwrap();
    id
}

#[allow(dead_code)]
pub fn make_state(pool: Pool<Postgres>) -> (AppState, MemoryBlobStore, ConnectionRegistry) {
    let registry = ConnectionRegistry::new();
    let blobs = MemoryBlobStore::new();
    let state = AppState {
        db: pool,
        notifier: RealtimeNotifier::new(registry.clone(), None),
        blobs: Arc::new(blobs.clone()),
        contacts: Arc::new(RoleVisibilityPolicy),
        config: Arc::new(Config::test_defaults()),
    };
    (state, blobs, registry)
}

#[allow(dead_code)]
pub async fn start_app(state: AppState) -> String {
    let app = routes::build_router(state);
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    format!("http://{}:{}", addr.ip(), addr.port())
}

#[allow(dead_code)]
pub fn bearer(user_id: Uuid) -> String {
    let claims = chat_service::middleware::auth::Claims {
        sub: user_id.to_string(),
        exp: chrono::Utc::now().timestamp() + 3600,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .unwrap();
    format!("Bearer {token}")
}
