//! Object storage backed by a directory per bucket.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::{fs, io::AsyncWriteExt};
use tracing::debug;
use uuid::Uuid;

use crate::application::repos::{ObjectStore, StoreError};

/// Stores each object as a file under `{root}/{bucket}/{key}`.
#[derive(Debug, Clone)]
pub struct FsObjectStore {
    base: PathBuf,
}

impl FsObjectStore {
    pub fn new(root: PathBuf, bucket: &str) -> Self {
        Self {
            base: root.join(bucket),
        }
    }

    /// Resolve a key to its file, rejecting anything that could escape the bucket.
    fn resolve(&self, key: &str) -> Result<PathBuf, StoreError> {
        let invalid = |reason| StoreError::InvalidKey {
            key: key.to_string(),
            reason,
        };
        if key.trim().is_empty() {
            return Err(invalid("key is empty"));
        }
        let relative = Path::new(key);
        if relative.is_absolute()
            || relative.components().any(|component| {
                matches!(
                    component,
                    Component::ParentDir | Component::RootDir | Component::Prefix(_)
                )
            })
        {
            return Err(invalid("key must stay inside the bucket"));
        }
        Ok(self.base.join(relative))
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    fn location(&self) -> String {
        format!("file://{}", self.base.display())
    }

    async fn get(&self, key: &str) -> Result<Option<Bytes>, StoreError> {
        let path = self.resolve(key)?;
        match fs::read(&path).await {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(StoreError::from_persistence(err)),
        }
    }

    /// Writes to a sibling temporary file first so readers never see a
    /// partially written object.
    async fn put(&self, key: &str, body: Bytes) -> Result<(), StoreError> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(StoreError::from_persistence)?;
        }

        let Some(file_name) = path.file_name().map(|name| name.to_string_lossy()) else {
            return Err(StoreError::InvalidKey {
                key: key.to_string(),
                reason: "key does not name an object",
            });
        };
        // Dot-prefixed so listings skip it.
        let staging =
            path.with_file_name(format!(".{file_name}.{}.tmp", Uuid::new_v4().simple()));
        let mut file = fs::File::create(&staging)
            .await
            .map_err(StoreError::from_persistence)?;
        let written = async {
            file.write_all(&body).await?;
            file.flush().await?;
            drop(file);
            fs::rename(&staging, &path).await
        }
        .await;

        if let Err(err) = written {
            let _ = fs::remove_file(&staging).await;
            return Err(StoreError::from_persistence(err));
        }

        debug!(
            target = "solstate::storage",
            key,
            bytes = body.len(),
            "object stored"
        );
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let directory = if prefix.trim_matches('/').is_empty() {
            self.base.clone()
        } else {
            self.resolve(prefix.trim_end_matches('/'))?
        };

        let mut entries = match fs::read_dir(&directory).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(StoreError::from_persistence(err)),
        };

        let mut keys = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(StoreError::from_persistence)?
        {
            let is_file = entry
                .file_type()
                .await
                .map_err(StoreError::from_persistence)?
                .is_file();
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if !is_file || name.starts_with('.') {
                continue;
            }
            keys.push(format!("{prefix}{name}"));
        }
        keys.sort();
        Ok(keys)
    }
}

/// Stand-in used when no bucket is configured; every call fails with
/// [`StoreError::NotConfigured`].
#[derive(Debug, Clone)]
pub struct UnconfiguredStore {
    reason: String,
}

impl UnconfiguredStore {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    fn error(&self) -> StoreError {
        StoreError::not_configured(self.reason.clone())
    }
}

#[async_trait]
impl ObjectStore for UnconfiguredStore {
    fn location(&self) -> String {
        "unconfigured".to_string()
    }

    async fn get(&self, _key: &str) -> Result<Option<Bytes>, StoreError> {
        Err(self.error())
    }

    async fn put(&self, _key: &str, _body: Bytes) -> Result<(), StoreError> {
        Err(self.error())
    }

    async fn list(&self, _prefix: &str) -> Result<Vec<String>, StoreError> {
        Err(self.error())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(dir: &tempfile::TempDir) -> FsObjectStore {
        FsObjectStore::new(dir.path().to_path_buf(), "bucket")
    }

    #[tokio::test]
    async fn put_get_and_list() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store(&dir);

        assert_eq!(store.get("blogs/a.json").await.expect("get"), None);
        store
            .put("blogs/b.json", Bytes::from_static(b"{}"))
            .await
            .expect("put");
        store
            .put("blogs/a.json", Bytes::from_static(b"[]"))
            .await
            .expect("put");

        assert_eq!(
            store.get("blogs/a.json").await.expect("get"),
            Some(Bytes::from_static(b"[]"))
        );
        assert_eq!(
            store.list("blogs/").await.expect("list"),
            vec!["blogs/a.json", "blogs/b.json"]
        );
        assert!(store.list("missing/").await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn overwrite_replaces_content() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store(&dir);
        store.put("k.json", Bytes::from_static(b"1")).await.expect("put");
        store.put("k.json", Bytes::from_static(b"2")).await.expect("put");
        assert_eq!(
            store.get("k.json").await.expect("get"),
            Some(Bytes::from_static(b"2"))
        );
        assert_eq!(store.list("").await.expect("list"), vec!["k.json"]);
    }

    #[tokio::test]
    async fn keys_resembling_staging_files_are_listed() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store(&dir);
        store
            .put("blogs/my.tmp-notes.json", Bytes::from_static(b"{}"))
            .await
            .expect("put");
        store
            .put("blogs/draft.json.tmp", Bytes::from_static(b"{}"))
            .await
            .expect("put");

        assert_eq!(
            store.list("blogs/").await.expect("list"),
            vec!["blogs/draft.json.tmp", "blogs/my.tmp-notes.json"]
        );
    }

    #[tokio::test]
    async fn escaping_keys_are_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store(&dir);
        for key in ["../outside.json", "/etc/passwd", "", "blogs/../../x"] {
            let err = store.get(key).await.expect_err("invalid key");
            assert!(matches!(err, StoreError::InvalidKey { .. }), "{key}");
        }
    }

    #[tokio::test]
    async fn unconfigured_store_fails_every_call() {
        let store = UnconfiguredStore::new("storage.bucket is not set");
        assert!(matches!(
            store.get("admin/api-data.json").await,
            Err(StoreError::NotConfigured { .. })
        ));
        assert!(matches!(
            store.list("blogs/").await,
            Err(StoreError::NotConfigured { .. })
        ));
    }
}
