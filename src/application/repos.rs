//! Persistence seams implemented by infrastructure adapters.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("object storage is not configured: {reason}")]
    NotConfigured { reason: String },
    #[error("invalid object key `{key}`: {reason}")]
    InvalidKey { key: String, reason: &'static str },
    #[error("object storage error: {0}")]
    Persistence(String),
}

impl StoreError {
    pub fn not_configured(reason: impl Into<String>) -> Self {
        Self::NotConfigured {
            reason: reason.into(),
        }
    }

    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Flat key/value blob storage addressed by `/`-separated keys.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Human-readable location reported back to clients (e.g. `file:///srv/data/bucket`).
    fn location(&self) -> String;

    /// `Ok(None)` when nothing is stored under `key`.
    async fn get(&self, key: &str) -> Result<Option<Bytes>, StoreError>;

    async fn put(&self, key: &str, body: Bytes) -> Result<(), StoreError>;

    /// Keys directly under `prefix`, sorted.
    async fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError>;
}
