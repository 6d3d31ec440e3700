use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use tracing::{info, instrument, warn};

use crate::{
    entities::upload::{CompressedImage, UploadOutcome, UploadTask},
    errors::StorageError,
    repositories::storage::ObjectStorage,
    use_cases::progress::ProgressAggregator,
    utils::file_name::sanitize_file_name,
};

/// Sends a batch of files to object storage concurrently, one independent outcome per file.
pub struct ParallelUploader<S>
where
    S: ObjectStorage,
{
    pub storage: S,
    pub timeout: Duration,
}

impl<S> ParallelUploader<S>
where
    S: ObjectStorage,
{
    pub fn new(storage: S, timeout: Duration) -> Self {
        ParallelUploader { storage, timeout }
    }

    /// `{collection}/{millis}_{index}_{file name}`
    pub fn storage_key(collection: &str, submitted_at: DateTime<Utc>, index: usize, file_name: &str) -> String {
        format!(
            "{}/{}_{}_{}",
            collection.trim_matches('/'),
            submitted_at.timestamp_millis(),
            index,
            sanitize_file_name(file_name)
        )
    }

    /// Uploads every file and returns one task per input, in input order.
    #[instrument(skip(self, files, progress), fields(files = files.len()))]
    pub async fn upload_tasks(
        &self,
        collection: &str,
        submitted_at: DateTime<Utc>,
        files: &[CompressedImage],
        progress: &ProgressAggregator,
    ) -> Vec<UploadTask> {
        if files.is_empty() {
            return Vec::new();
        }

        let uploads = files.iter().enumerate().map(|(index, image)| {
            let key = Self::storage_key(collection, submitted_at, index, &image.original_name);
            async move {
                let outcome = self.upload_one(&key, image).await;
                progress.record_settlement();

                UploadTask {
                    index,
                    file_name: image.original_name.clone(),
                    key,
                    outcome,
                }
            }
        });

        let tasks = join_all(uploads).await;

        let succeeded = tasks.iter().filter(|t| t.is_success()).count();
        info!(succeeded, failed = tasks.len() - succeeded, "Upload batch settled");

        tasks
    }

    /// URL per input slot, `None` where the upload failed.
    pub async fn upload_all(
        &self,
        collection: &str,
        submitted_at: DateTime<Utc>,
        files: &[CompressedImage],
        progress: &ProgressAggregator,
    ) -> Vec<Option<String>> {
        self.upload_tasks(collection, submitted_at, files, progress)
            .await
            .into_iter()
            .map(|task| task.outcome.into_url())
            .collect()
    }

    async fn upload_one(&self, key: &str, image: &CompressedImage) -> UploadOutcome {
        let file = &image.file;
        let put = self.storage.put(key, &file.bytes, &file.content_type);

        let result = match tokio::time::timeout(self.timeout, put).await {
            Ok(result) => result,
            Err(_) => Err(StorageError::Timeout(self.timeout)),
        };

        match result {
            Ok(url) => UploadOutcome::Succeeded(url),
            Err(e) => {
                warn!(key, error = %e, "Image upload failed");
                UploadOutcome::Failed(e.to_string())
            }
        }
    }
}
