use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, instrument};

use crate::{errors::StorageError, repositories::storage::ObjectStorage, settings::AppConfig};

/// Stores objects as plain files under a root directory served at `public_base_url`.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
    public_base_url: String,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        LocalStorage {
            root: root.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(&config.media_root, &config.public_base_url)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, key: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(key);
        let safe = !key.is_empty()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)));

        if !safe {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(relative))
    }

    fn key_from_url<'a>(&self, url: &'a str) -> Result<&'a str, StorageError> {
        url.strip_prefix(&self.public_base_url)
            .and_then(|rest| rest.strip_prefix('/'))
            .ok_or_else(|| StorageError::InvalidUrl(url.to_string()))
    }
}

#[async_trait]
impl ObjectStorage for LocalStorage {
    #[instrument(skip(self, bytes, _content_type), fields(size = bytes.len()))]
    async fn put(&self, key: &str, bytes: &[u8], _content_type: &str) -> Result<String, StorageError> {
        let path = self.resolve(key)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, bytes).await?;

        debug!(path = %path.display(), "Object written");
        Ok(format!("{}/{}", self.public_base_url, key))
    }

    #[instrument(skip(self))]
    async fn delete(&self, url: &str) -> Result<(), StorageError> {
        let key = self.key_from_url(url)?;
        let path = self.resolve(key)?;

        fs::remove_file(&path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => StorageError::NotFound(key.to_string()),
            _ => StorageError::from(e),
        })
    }
}
