use std::sync::Arc;

use chrono::Utc;
use tokio::sync::watch;
use tracing::{error, info, instrument, warn};
use validator::Validate;

use crate::{
    entities::{
        property::Property,
        submission::{PropertySubmission, SubmissionOutcome, SubmissionState},
    },
    errors::AppError,
    imaging::compressor::ImageCompressor,
    repositories::{admin::AdminRepository, property::PropertyRepository, storage::ObjectStorage},
    use_cases::{
        compose::compose_record, persistence::PersistenceWriter, progress::ProgressAggregator,
        upload::ParallelUploader,
    },
};

/// Publishes the state of one submission. Clones observe the same state.
#[derive(Clone)]
pub struct SubmissionTracker {
    sender: Arc<watch::Sender<SubmissionState>>,
}

impl Default for SubmissionTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl SubmissionTracker {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(SubmissionState::Idle);
        SubmissionTracker {
            sender: Arc::new(sender),
        }
    }

    pub fn state(&self) -> SubmissionState {
        *self.sender.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<SubmissionState> {
        self.sender.subscribe()
    }

    fn transition(&self, next: SubmissionState) {
        info!(state = %next, "Submission state changed");
        self.sender.send_replace(next);
    }
}

/// Runs the compress, upload, compose and persist flow for one form submission.
pub struct PropertySubmissionHandler<R, S, A>
where
    R: PropertyRepository,
    S: ObjectStorage,
    A: AdminRepository,
{
    pub writer: PersistenceWriter<R>,
    pub uploader: ParallelUploader<S>,
    pub admin_repo: A,
    pub compressor: ImageCompressor,
    pub collection: String,
}

impl<R, S, A> PropertySubmissionHandler<R, S, A>
where
    R: PropertyRepository,
    S: ObjectStorage,
    A: AdminRepository,
{
    pub fn new(
        writer: PersistenceWriter<R>,
        uploader: ParallelUploader<S>,
        admin_repo: A,
        compressor: ImageCompressor,
        collection: impl Into<String>,
    ) -> Self {
        PropertySubmissionHandler {
            writer,
            uploader,
            admin_repo,
            compressor,
            collection: collection.into(),
        }
    }

    pub async fn submit(&self, submission: PropertySubmission) -> Result<SubmissionOutcome, AppError> {
        self.submit_tracked(submission, &SubmissionTracker::new()).await
    }

    /// Invalid forms, unknown or inactive admins and missing edit targets are rejected
    /// with an error before any file is touched. Once the flow starts, only a store
    /// failure ends it unsuccessfully, and that is reported as `SubmissionOutcome::Failed`.
    #[instrument(
        skip(self, submission, tracker),
        fields(admin_id = %submission.admin_id, property_id = ?submission.property_id, files = submission.images.len())
    )]
    pub async fn submit_tracked(
        &self,
        submission: PropertySubmission,
        tracker: &SubmissionTracker,
    ) -> Result<SubmissionOutcome, AppError> {
        submission.form.validate()?;
        self.authorize(&submission).await?;

        let existing = match &submission.property_id {
            Some(id) => Some(self.load_existing(id).await?),
            None => None,
        };
        let existing_images = existing
            .as_ref()
            .map(|p| p.details.images.clone())
            .unwrap_or_default();

        let PropertySubmission { form, images, admin_id, property_id } = submission;
        let total = images.len();

        tracker.transition(SubmissionState::Compressing);
        let compressed = self.compressor.compress_all(images).await;

        tracker.transition(SubmissionState::Uploading);
        let observer = tracker.clone();
        let progress = ProgressAggregator::with_observer(total, move |snapshot| {
            observer.transition(SubmissionState::Aggregating {
                completed: snapshot.completed,
                total: snapshot.total,
            });
        });
        tracker.transition(SubmissionState::Aggregating { completed: 0, total });

        let uploaded = self
            .uploader
            .upload_all(&self.collection, Utc::now(), &compressed, &progress)
            .await;
        let succeeded = uploaded.iter().filter(|url| url.is_some()).count();
        let failed = total - succeeded;

        tracker.transition(SubmissionState::Composing);
        let details = compose_record(&form, &existing_images, &uploaded);

        tracker.transition(SubmissionState::Persisting);
        let saved = match property_id {
            Some(id) => self.writer.update(&id, details).await,
            None => self.writer.create(details, admin_id).await,
        };

        match saved {
            Ok(property) => {
                tracker.transition(SubmissionState::Done);
                let warning = upload_warning(succeeded, total);
                if let Some(message) = &warning {
                    warn!(succeeded, failed, "{}", message);
                }
                Ok(SubmissionOutcome::Saved {
                    property,
                    uploaded: succeeded,
                    failed,
                    warning,
                })
            }
            Err(e) => {
                tracker.transition(SubmissionState::Failed);
                error!(error = %e, "Failed to save property");
                Ok(SubmissionOutcome::Failed {
                    message: format!("Failed to save property: {}", e),
                })
            }
        }
    }

    async fn authorize(&self, submission: &PropertySubmission) -> Result<(), AppError> {
        let admin = self
            .admin_repo
            .get_admin_by_id(&submission.admin_id)
            .await?
            .ok_or(AppError::ForbiddenAccess)?;

        if !admin.is_active {
            warn!(admin_id = %admin.id, "Inactive admin attempted a submission");
            return Err(AppError::ForbiddenAccess);
        }
        Ok(())
    }

    async fn load_existing(&self, id: &uuid::Uuid) -> Result<Property, AppError> {
        self.writer
            .repo
            .get_property_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Property".into()))
    }
}

fn upload_warning(succeeded: usize, total: usize) -> Option<String> {
    if succeeded == total {
        None
    } else if succeeded == 0 {
        Some(format!(
            "None of the {} images could be uploaded; property saved without new images",
            total
        ))
    } else {
        Some(format!("{} of {} images uploaded", succeeded, total))
    }
}
