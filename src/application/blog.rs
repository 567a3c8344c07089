//! Blog documents persisted as JSON blobs in the object store.

use std::sync::Arc;

use bytes::Bytes;
use solstate_api_types::BlogDocument;
use time::OffsetDateTime;
use tracing::info;

use crate::application::error::AppError;
use crate::application::repos::ObjectStore;
use crate::domain::blog::{canonical_slug, prepare_document};
use crate::domain::error::DomainError;
use crate::infra::error::InfraError;

const BLOG_PREFIX: &str = "blogs/";
const BLOG_SUFFIX: &str = ".json";

fn blog_key(slug: &str) -> String {
    format!("{BLOG_PREFIX}{slug}{BLOG_SUFFIX}")
}

#[derive(Clone)]
pub struct BlogService {
    store: Arc<dyn ObjectStore>,
    clock: fn() -> OffsetDateTime,
}

impl BlogService {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store,
            clock: OffsetDateTime::now_utc,
        }
    }

    pub fn with_clock(mut self, clock: fn() -> OffsetDateTime) -> Self {
        self.clock = clock;
        self
    }

    /// Validate and store a document, returning what was written.
    ///
    /// Re-saving an existing slug keeps the earliest known creation time.
    pub async fn save(&self, document: BlogDocument) -> Result<BlogDocument, AppError> {
        let mut prepared = prepare_document(document, (self.clock)())?;
        let key = blog_key(&prepared.blog_post.slug);

        if let Some(existing) = self.load(&key).await?
            && let Some(created_at) = existing.blog_post.created_at
        {
            prepared.blog_post.created_at = prepared.blog_post.created_at.min(Some(created_at));
        }

        let body = serde_json::to_vec_pretty(&prepared).map_err(InfraError::from)?;
        self.store.put(&key, Bytes::from(body)).await?;

        info!(
            target = "solstate::blog",
            slug = %prepared.blog_post.slug,
            status = ?prepared.blog_post.status,
            blocks = prepared.content.len(),
            "blog post saved"
        );
        Ok(prepared)
    }

    pub async fn get(&self, slug: &str) -> Result<BlogDocument, AppError> {
        let canonical = canonical_slug(slug).map_err(|_| DomainError::not_found("blog post"))?;
        if canonical != slug {
            return Err(DomainError::not_found("blog post").into());
        }
        self.load(&blog_key(slug))
            .await?
            .ok_or_else(|| DomainError::not_found("blog post").into())
    }

    /// Stored slugs, sorted.
    pub async fn list(&self) -> Result<Vec<String>, AppError> {
        let keys = self.store.list(BLOG_PREFIX).await?;
        Ok(keys
            .iter()
            .filter_map(|key| {
                key.strip_prefix(BLOG_PREFIX)?
                    .strip_suffix(BLOG_SUFFIX)
                    .map(str::to_string)
            })
            .collect())
    }

    async fn load(&self, key: &str) -> Result<Option<BlogDocument>, AppError> {
        match self.store.get(key).await? {
            Some(body) => Ok(Some(
                serde_json::from_slice(&body).map_err(InfraError::from)?,
            )),
            None => Ok(None),
        }
    }
}
