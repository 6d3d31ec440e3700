use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{types::Json, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    entities::property::{Property, PropertyDetails, PropertyInsert, PropertyQuery, PropertyUpdate},
    errors::AppError,
    repositories::sqlx_repo::SqlxPropertyRepo,
};

const PROPERTY_COLUMNS: &str = "id, details, created_by, created_at, updated_at";

/// Renders `details.location` the same way `Location::display_text` does,
/// so structured addresses are searched by their values and not their JSON keys.
const LOCATION_TEXT_SQL: &str = r#"
    CASE jsonb_typeof(details->'location')
        WHEN 'object' THEN concat(
            details->'location'->>'address', ', ',
            details->'location'->>'city', ', ',
            details->'location'->>'state', ' ',
            details->'location'->>'pincode')
        ELSE btrim(details->>'location')
    END"#;

/// Document store boundary for listings.
#[async_trait]
pub trait PropertyRepository: Send + Sync {
    /// Inserts a new document and returns the generated id
    async fn create_property(&self, insert: &PropertyInsert) -> Result<Uuid, AppError>;

    /// Overwrites the document body and `updated_at`; `created_at` and `created_by` are kept
    async fn update_property(&self, id: &Uuid, update: &PropertyUpdate) -> Result<Property, AppError>;

    async fn get_property_by_id(&self, id: &Uuid) -> Result<Option<Property>, AppError>;

    /// Newest first
    async fn query_properties(&self, query: &PropertyQuery) -> Result<Vec<Property>, AppError>;

    async fn set_property_images(
        &self,
        id: &Uuid,
        images: &[String],
        updated_at: DateTime<Utc>,
    ) -> Result<Property, AppError>;

    async fn set_property_flags(
        &self,
        id: &Uuid,
        is_featured: Option<bool>,
        is_active: Option<bool>,
        updated_at: DateTime<Utc>,
    ) -> Result<Property, AppError>;

    async fn delete_property(&self, id: &Uuid) -> Result<(), AppError>;

    async fn check_connection(&self) -> Result<(), AppError>;
}

#[async_trait]
impl<T> PropertyRepository for Arc<T>
where
    T: PropertyRepository + ?Sized,
{
    async fn create_property(&self, insert: &PropertyInsert) -> Result<Uuid, AppError> {
        (**self).create_property(insert).await
    }

    async fn update_property(&self, id: &Uuid, update: &PropertyUpdate) -> Result<Property, AppError> {
        (**self).update_property(id, update).await
    }

    async fn get_property_by_id(&self, id: &Uuid) -> Result<Option<Property>, AppError> {
        (**self).get_property_by_id(id).await
    }

    async fn query_properties(&self, query: &PropertyQuery) -> Result<Vec<Property>, AppError> {
        (**self).query_properties(query).await
    }

    async fn set_property_images(
        &self,
        id: &Uuid,
        images: &[String],
        updated_at: DateTime<Utc>,
    ) -> Result<Property, AppError> {
        (**self).set_property_images(id, images, updated_at).await
    }

    async fn set_property_flags(
        &self,
        id: &Uuid,
        is_featured: Option<bool>,
        is_active: Option<bool>,
        updated_at: DateTime<Utc>,
    ) -> Result<Property, AppError> {
        (**self).set_property_flags(id, is_featured, is_active, updated_at).await
    }

    async fn delete_property(&self, id: &Uuid) -> Result<(), AppError> {
        (**self).delete_property(id).await
    }

    async fn check_connection(&self) -> Result<(), AppError> {
        (**self).check_connection().await
    }
}

// ───── Postgres ──────────────────────────────────────────────────────

#[derive(Debug, sqlx::FromRow)]
struct PropertyRow {
    id: Uuid,
    details: Json<PropertyDetails>,
    created_by: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PropertyRow> for Property {
    fn from(row: PropertyRow) -> Self {
        Property {
            id: row.id,
            details: row.details.0,
            created_by: row.created_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl SqlxPropertyRepo {
    pub fn new(pool: PgPool) -> Self {
        SqlxPropertyRepo { pool }
    }
}

#[async_trait]
impl PropertyRepository for SqlxPropertyRepo {
    async fn create_property(&self, insert: &PropertyInsert) -> Result<Uuid, AppError> {
        let details = &insert.details;

        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO properties (
                name, status, property_type, is_featured, is_active,
                details, created_by, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            "#,
        )
        .bind(&details.name)
        .bind(details.status.as_str())
        .bind(details.property_type.map(|t| t.as_str()))
        .bind(details.is_featured)
        .bind(details.is_active)
        .bind(Json(details))
        .bind(insert.created_by)
        .bind(insert.created_at)
        .bind(insert.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    async fn update_property(&self, id: &Uuid, update: &PropertyUpdate) -> Result<Property, AppError> {
        let details = &update.details;

        let row = sqlx::query_as::<_, PropertyRow>(&format!(
            r#"
            UPDATE properties SET
                name = $1,
                status = $2,
                property_type = $3,
                is_featured = $4,
                is_active = $5,
                details = $6,
                updated_at = $7
            WHERE id = $8
            RETURNING {PROPERTY_COLUMNS}
            "#
        ))
        .bind(&details.name)
        .bind(details.status.as_str())
        .bind(details.property_type.map(|t| t.as_str()))
        .bind(details.is_featured)
        .bind(details.is_active)
        .bind(Json(details))
        .bind(update.updated_at)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Property".into()))?;

        Ok(row.into())
    }

    async fn get_property_by_id(&self, id: &Uuid) -> Result<Option<Property>, AppError> {
        let row = sqlx::query_as::<_, PropertyRow>(&format!(
            "SELECT {PROPERTY_COLUMNS} FROM properties WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Property::from))
    }

    async fn query_properties(&self, query: &PropertyQuery) -> Result<Vec<Property>, AppError> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {PROPERTY_COLUMNS} FROM properties WHERE TRUE"));

        if query.active_only {
            builder.push(" AND is_active = TRUE");
        }
        if query.featured_only {
            builder.push(" AND is_featured = TRUE");
        }
        if let Some(status) = query.status {
            builder.push(" AND status = ").push_bind(status.as_str());
        }
        if let Some(property_type) = query.property_type {
            builder.push(" AND property_type = ").push_bind(property_type.as_str());
        }
        if let Some(term) = query.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            let pattern = format!("%{}%", term.to_lowercase());
            builder
                .push(" AND (LOWER(name) LIKE ")
                .push_bind(pattern.clone())
                .push(format!(" OR LOWER({LOCATION_TEXT_SQL}) LIKE "))
                .push_bind(pattern)
                .push(")");
        }

        builder.push(" ORDER BY created_at DESC");

        if let Some(limit) = query.limit {
            builder.push(" LIMIT ").push_bind(limit as i64);
        }

        let rows = builder
            .build_query_as::<PropertyRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Property::from).collect())
    }

    async fn set_property_images(
        &self,
        id: &Uuid,
        images: &[String],
        updated_at: DateTime<Utc>,
    ) -> Result<Property, AppError> {
        let row = sqlx::query_as::<_, PropertyRow>(&format!(
            r#"
            UPDATE properties SET
                details = jsonb_set(details, '{{images}}', $1),
                updated_at = $2
            WHERE id = $3
            RETURNING {PROPERTY_COLUMNS}
            "#
        ))
        .bind(Json(images))
        .bind(updated_at)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Property".into()))?;

        Ok(row.into())
    }

    async fn set_property_flags(
        &self,
        id: &Uuid,
        is_featured: Option<bool>,
        is_active: Option<bool>,
        updated_at: DateTime<Utc>,
    ) -> Result<Property, AppError> {
        // COALESCE keeps the stored flag when None is provided
        let row = sqlx::query_as::<_, PropertyRow>(&format!(
            r#"
            UPDATE properties SET
                is_featured = COALESCE($1, is_featured),
                is_active = COALESCE($2, is_active),
                details = details || jsonb_build_object(
                    'is_featured', COALESCE($1, is_featured),
                    'is_active', COALESCE($2, is_active)
                ),
                updated_at = $3
            WHERE id = $4
            RETURNING {PROPERTY_COLUMNS}
            "#
        ))
        .bind(is_featured)
        .bind(is_active)
        .bind(updated_at)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Property".into()))?;

        Ok(row.into())
    }

    async fn delete_property(&self, id: &Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM properties WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Property".into()));
        }
        Ok(())
    }

    async fn check_connection(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
