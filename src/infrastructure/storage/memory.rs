use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use async_trait::async_trait;
use dashmap::DashMap;

use crate::{errors::StorageError, repositories::storage::ObjectStorage};

const SCHEME: &str = "memory://";

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Keeps blobs in process memory. Clones share the same objects.
#[derive(Clone, Default)]
pub struct InMemoryStorage {
    objects: Arc<DashMap<String, StoredObject>>,
    puts: Arc<AtomicUsize>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<StoredObject> {
        self.objects.get(key).map(|entry| entry.value().clone())
    }

    pub fn contains_url(&self, url: &str) -> bool {
        url.strip_prefix(SCHEME)
            .is_some_and(|key| self.objects.contains_key(key))
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn clear(&self) {
        self.objects.clear();
    }

    /// Number of `put` calls served, including overwrites.
    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectStorage for InMemoryStorage {
    async fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<String, StorageError> {
        if key.trim().is_empty() {
            return Err(StorageError::InvalidKey(key.to_string()));
        }

        self.puts.fetch_add(1, Ordering::SeqCst);
        self.objects.insert(
            key.to_string(),
            StoredObject {
                bytes: bytes.to_vec(),
                content_type: content_type.to_string(),
            },
        );
        Ok(format!("{SCHEME}{key}"))
    }

    async fn delete(&self, url: &str) -> Result<(), StorageError> {
        let key = url
            .strip_prefix(SCHEME)
            .ok_or_else(|| StorageError::InvalidUrl(url.to_string()))?;

        self.objects
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }
}
