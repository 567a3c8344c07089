//! Curated dashboard data the admin tooling loads and saves as one JSON blob.

use std::sync::Arc;

use bytes::Bytes;
use serde_json::Value;
use tracing::{debug, info};

use crate::application::error::AppError;
use crate::application::repos::ObjectStore;
use crate::infra::error::InfraError;

pub const ADMIN_DATA_KEY: &str = "admin/api-data.json";

#[derive(Clone)]
pub struct AdminDataService {
    store: Arc<dyn ObjectStore>,
}

impl AdminDataService {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Where the blob lives, as reported to clients.
    pub fn source(&self) -> String {
        format!("{}/{ADMIN_DATA_KEY}", self.store.location())
    }

    /// The stored object, or `None` when nothing has been saved yet.
    pub async fn load(&self) -> Result<Option<Value>, AppError> {
        let Some(body) = self.store.get(ADMIN_DATA_KEY).await? else {
            debug!(target = "solstate::admin", "no admin data stored yet");
            return Ok(None);
        };
        let data = serde_json::from_slice(&body).map_err(InfraError::from)?;
        Ok(Some(data))
    }

    pub async fn save(&self, data: Value) -> Result<(), AppError> {
        if !data.is_object() {
            return Err(AppError::validation("admin data must be a JSON object"));
        }
        let body = serde_json::to_vec(&data).map_err(InfraError::from)?;
        let bytes = body.len();
        self.store.put(ADMIN_DATA_KEY, Bytes::from(body)).await?;
        info!(target = "solstate::admin", bytes, "admin data saved");
        Ok(())
    }
}
