//! Blob storage behind a trait seam: the core depends only on the
//! (bytes, key) -> public URL contract.

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::error::{AppError, AppResult};

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store the payload under `key` and return a publicly fetchable URL.
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> AppResult<String>;
}

#[derive(Debug, Clone)]
pub struct S3Config {
    pub bucket: String,
    /// CDN or endpoint base used to build public object URLs.
    pub base_url: String,
}

impl S3Config {
    pub fn from_env() -> Self {
        Self {
            bucket: std::env::var("S3_BUCKET").unwrap_or_else(|_| "chat-attachments".into()),
            base_url: std::env::var("S3_BASE_URL")
                .unwrap_or_else(|_| "https://s3.amazonaws.com".into()),
        }
    }

    pub fn object_url(&self, key: &str) -> String {
        format!("{}/{}/{}", self.base_url, self.bucket, key)
    }
}

#[derive(Clone)]
pub struct S3BlobStore {
    client: Arc<Client>,
    config: S3Config,
}

impl S3BlobStore {
    pub async fn new(config: S3Config) -> Self {
        let aws_config = aws_config::load_from_env().await;
        Self {
            client: Arc::new(Client::new(&aws_config)),
            config,
        }
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> AppResult<String> {
        self.client
            .put_object()
            .bucket(&self.config.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| AppError::Transient(format!("s3 put: {e}")))?;

        Ok(self.config.object_url(key))
    }
}

/// In-process store for tests and local runs without S3 credentials.
#[derive(Default, Clone)]
pub struct MemoryBlobStore {
    inner: Arc<Mutex<HashMap<String, (Vec<u8>, String)>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.inner.lock().await.contains_key(key)
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.is_empty()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> AppResult<String> {
        self.inner
            .lock()
            .await
            .insert(key.to_string(), (bytes, content_type.to_string()));
        Ok(format!("memory://{key}"))
    }
}
