use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::{
    entities::property::{Property, PropertyDetails, PropertyInsert, PropertyUpdate},
    errors::AppError,
    repositories::property::PropertyRepository,
};

pub struct PersistenceWriter<R>
where
    R: PropertyRepository,
{
    pub repo: R,
    pub verify_writes: bool,
}

impl<R> PersistenceWriter<R>
where
    R: PropertyRepository,
{
    pub fn new(repo: R, verify_writes: bool) -> Self {
        PersistenceWriter { repo, verify_writes }
    }

    /// Stores a new listing; creation and update timestamps are equal.
    #[instrument(skip(self, details), fields(name = %details.name))]
    pub async fn create(&self, details: PropertyDetails, created_by: Uuid) -> Result<Property, AppError> {
        let insert = PropertyInsert::prepare(details, created_by);
        let id = self.repo.create_property(&insert).await?;
        let property = insert.into_property(id);

        info!(property_id = %id, images = property.details.images.len(), "Property created");
        self.verify(&property).await;
        Ok(property)
    }

    /// Replaces the body of an existing listing and stamps `updated_at` only.
    #[instrument(skip(self, details), fields(property_id = %id))]
    pub async fn update(&self, id: &Uuid, details: PropertyDetails) -> Result<Property, AppError> {
        let update = PropertyUpdate::prepare(details);
        let property = self.repo.update_property(id, &update).await?;

        info!(images = property.details.images.len(), "Property updated");
        self.verify(&property).await;
        Ok(property)
    }

    /// Reads the document back and compares the image list. Only logs.
    async fn verify(&self, written: &Property) {
        if !self.verify_writes {
            return;
        }

        match self.repo.get_property_by_id(&written.id).await {
            Ok(Some(stored)) if stored.details.images == written.details.images => {
                debug!(property_id = %written.id, "Write verified");
            }
            Ok(Some(stored)) => warn!(
                property_id = %written.id,
                expected = written.details.images.len(),
                stored = stored.details.images.len(),
                "Stored image list differs from the written one"
            ),
            Ok(None) => warn!(property_id = %written.id, "Property missing right after write"),
            Err(e) => warn!(property_id = %written.id, error = %e, "Write verification failed"),
        }
    }
}
