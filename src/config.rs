use dotenvy::dotenv;
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub port: u16,
    pub jwt_secret: String,
    /// Hard cap on staged attachment payloads, in bytes.
    pub max_attachment_bytes: i64,
    /// Bound on a single blob upload; elapsed timeout is treated as upload
    /// failure and the message append is never attempted.
    pub upload_timeout_secs: u64,
}

pub const DEFAULT_MAX_ATTACHMENT_BYTES: i64 = 10 * 1024 * 1024;

impl Config {
    pub fn from_env() -> Result<Self, crate::error::AppError> {
        dotenv().ok();
        let database_url = env::var("DATABASE_URL")
            .map_err(|_| crate::error::AppError::Config("DATABASE_URL missing".into()))?;
        let redis_url = env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".into());
        let port = env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3000);
        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| crate::error::AppError::Config("JWT_SECRET missing".into()))?;
        let max_attachment_bytes = env::var("MAX_ATTACHMENT_BYTES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_MAX_ATTACHMENT_BYTES);
        let upload_timeout_secs = env::var("UPLOAD_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(30);

        Ok(Self {
            database_url,
            redis_url,
            port,
            jwt_secret,
            max_attachment_bytes,
            upload_timeout_secs,
        })
    }

    pub fn test_defaults() -> Self {
        Self {
            database_url: "postgres://localhost/chat_test".into(),
            redis_url: "redis://127.0.0.1:6379/0".into(),
            port: 3000,
            jwt_secret: "test-secret".into(),
            max_attachment_bytes: DEFAULT_MAX_ATTACHMENT_BYTES,
            upload_timeout_secs: 5,
        }
    }
}
