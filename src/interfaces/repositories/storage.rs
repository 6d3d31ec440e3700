use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::StorageError;

/// Blob storage addressed by key on write and by download URL afterwards.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Stores `bytes` under `key` and returns a publicly resolvable URL.
    async fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<String, StorageError>;

    /// Removes the object a previously returned URL points at.
    async fn delete(&self, url: &str) -> Result<(), StorageError>;
}

#[async_trait]
impl<T> ObjectStorage for Arc<T>
where
    T: ObjectStorage + ?Sized,
{
    async fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<String, StorageError> {
        (**self).put(key, bytes, content_type).await
    }

    async fn delete(&self, url: &str) -> Result<(), StorageError> {
        (**self).delete(url).await
    }
}
