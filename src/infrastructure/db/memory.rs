use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use crate::{
    entities::{
        admin::Admin,
        property::{Property, PropertyInsert, PropertyQuery, PropertyUpdate},
    },
    errors::AppError,
    repositories::{admin::AdminRepository, property::PropertyRepository},
};

/// Process-local document store. Clones share the same map.
#[derive(Clone, Default)]
pub struct InMemoryPropertyRepo {
    documents: Arc<DashMap<Uuid, Property>>,
}

impl InMemoryPropertyRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    fn modify<F>(&self, id: &Uuid, apply: F) -> Result<Property, AppError>
    where
        F: FnOnce(&mut Property),
    {
        let mut entry = self
            .documents
            .get_mut(id)
            .ok_or_else(|| AppError::NotFound("Property".into()))?;
        apply(entry.value_mut());
        Ok(entry.value().clone())
    }
}

#[async_trait]
impl PropertyRepository for InMemoryPropertyRepo {
    async fn create_property(&self, insert: &PropertyInsert) -> Result<Uuid, AppError> {
        let id = Uuid::new_v4();
        self.documents.insert(id, insert.clone().into_property(id));
        Ok(id)
    }

    async fn update_property(&self, id: &Uuid, update: &PropertyUpdate) -> Result<Property, AppError> {
        self.modify(id, |property| {
            property.details = update.details.clone();
            property.updated_at = update.updated_at;
        })
    }

    async fn get_property_by_id(&self, id: &Uuid) -> Result<Option<Property>, AppError> {
        Ok(self.documents.get(id).map(|entry| entry.value().clone()))
    }

    async fn query_properties(&self, query: &PropertyQuery) -> Result<Vec<Property>, AppError> {
        let mut properties: Vec<Property> = self
            .documents
            .iter()
            .filter(|entry| entry.value().matches(query))
            .map(|entry| entry.value().clone())
            .collect();

        properties.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        if let Some(limit) = query.limit {
            properties.truncate(limit);
        }
        Ok(properties)
    }

    async fn set_property_images(
        &self,
        id: &Uuid,
        images: &[String],
        updated_at: DateTime<Utc>,
    ) -> Result<Property, AppError> {
        self.modify(id, |property| {
            property.details.images = images.to_vec();
            property.updated_at = updated_at;
        })
    }

    async fn set_property_flags(
        &self,
        id: &Uuid,
        is_featured: Option<bool>,
        is_active: Option<bool>,
        updated_at: DateTime<Utc>,
    ) -> Result<Property, AppError> {
        self.modify(id, |property| {
            if let Some(featured) = is_featured {
                property.details.is_featured = featured;
            }
            if let Some(active) = is_active {
                property.details.is_active = active;
            }
            property.updated_at = updated_at;
        })
    }

    async fn delete_property(&self, id: &Uuid) -> Result<(), AppError> {
        self.documents
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound("Property".into()))
    }

    async fn check_connection(&self) -> Result<(), AppError> {
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct InMemoryAdminRepo {
    admins: Arc<DashMap<Uuid, Admin>>,
}

impl InMemoryAdminRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_admin(&self, admin: Admin) {
        self.admins.insert(admin.id, admin);
    }
}

#[async_trait]
impl AdminRepository for InMemoryAdminRepo {
    async fn get_admin_by_id(&self, id: &Uuid) -> Result<Option<Admin>, AppError> {
        Ok(self.admins.get(id).map(|entry| entry.value().clone()))
    }
}
