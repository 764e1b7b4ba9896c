use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use std::time::Duration;

pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

pub async fn init_pool(database_url: &str) -> Result<Pool<Postgres>, sqlx::Error> {
    let max_connections = env_u64("DB_MAX_CONNECTIONS", 20) as u32;
    let acquire_timeout = Duration::from_secs(env_u64("DB_ACQUIRE_TIMEOUT_SECS", 10));
    let idle_timeout = Duration::from_secs(env_u64("DB_IDLE_TIMEOUT_SECS", 600));

    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(acquire_timeout)
        .idle_timeout(idle_timeout)
        .connect(database_url)
        .await
}
