use std::time::Duration;

use chrono::Utc;
use futures::future::join_all;
use tracing::{info, instrument, warn};

use crate::{
    constants::FEATURED_LIMIT,
    entities::property::{Property, PropertyQuery, PropertyStats},
    errors::{AppError, StorageError},
    repositories::{property::PropertyRepository, storage::ObjectStorage},
    utils::valid_uuid::valid_uuid,
};

/// Listing reads and the explicit admin actions that follow a save.
pub struct PropertyHandler<R, S>
where
    R: PropertyRepository,
    S: ObjectStorage,
{
    pub property_repo: R,
    pub storage: S,
    delete_timeout: Duration,
}

impl<R, S> PropertyHandler<R, S>
where
    R: PropertyRepository,
    S: ObjectStorage,
{
    pub fn new(property_repo: R, storage: S, delete_timeout: Duration) -> Self {
        PropertyHandler {
            property_repo,
            storage,
            delete_timeout,
        }
    }

    /// A blob delete bounded by `delete_timeout`.
    async fn delete_blob(&self, url: &str) -> Result<(), StorageError> {
        tokio::time::timeout(self.delete_timeout, self.storage.delete(url))
            .await
            .map_err(|_| StorageError::Timeout(self.delete_timeout))?
    }

    pub async fn get_property(&self, id: &str) -> Result<Property, AppError> {
        let id = valid_uuid(id)?;
        self.property_repo
            .get_property_by_id(&id)
            .await?
            .ok_or_else(|| AppError::NotFound("Property".into()))
    }

    pub async fn list_properties(&self, query: &PropertyQuery) -> Result<Vec<Property>, AppError> {
        self.property_repo.query_properties(query).await
    }

    /// Active featured listings, newest first.
    pub async fn featured_properties(&self) -> Result<Vec<Property>, AppError> {
        self.property_repo
            .query_properties(&PropertyQuery::featured(FEATURED_LIMIT))
            .await
    }

    pub async fn property_stats(&self) -> Result<PropertyStats, AppError> {
        let all = self.property_repo.query_properties(&PropertyQuery::default()).await?;
        Ok(PropertyStats::from_properties(&all))
    }

    /// Hard delete. Stored images are removed first; a blob that cannot be removed is only logged.
    #[instrument(skip(self))]
    pub async fn delete_property(&self, id: &str) -> Result<(), AppError> {
        let property = self.get_property(id).await?;

        let deletions = property.details.images.iter().map(|url| async move {
            if let Err(e) = self.delete_blob(url).await {
                warn!(url = %url, error = %e, "Failed to delete stored image");
            }
        });
        join_all(deletions).await;

        self.property_repo.delete_property(&property.id).await?;
        info!(property_id = %property.id, "Property deleted");
        Ok(())
    }

    /// Drops one image from the listing, then deletes its blob best-effort.
    #[instrument(skip(self))]
    pub async fn remove_image(&self, id: &str, url: &str) -> Result<Property, AppError> {
        let property = self.get_property(id).await?;

        if !property.details.images.iter().any(|image| image == url) {
            return Err(AppError::NotFound("Image".into()));
        }

        let remaining: Vec<String> = property
            .details
            .images
            .into_iter()
            .filter(|image| image != url)
            .collect();

        let updated = self
            .property_repo
            .set_property_images(&property.id, &remaining, Utc::now())
            .await?;

        if let Err(e) = self.delete_blob(url).await {
            warn!(error = %e, "Image detached but blob could not be deleted");
        }

        Ok(updated)
    }

    /// Toggles the featured and active flags. `None` leaves a flag as stored.
    #[instrument(skip(self))]
    pub async fn set_visibility(
        &self,
        id: &str,
        is_featured: Option<bool>,
        is_active: Option<bool>,
    ) -> Result<Property, AppError> {
        let id = valid_uuid(id)?;
        if is_featured.is_none() && is_active.is_none() {
            return Err(AppError::InvalidInput("No visibility change requested".into()));
        }

        self.property_repo
            .set_property_flags(&id, is_featured, is_active, Utc::now())
            .await
    }
}
