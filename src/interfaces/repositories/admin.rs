use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    entities::admin::{Admin, AdminRow},
    errors::AppError,
    repositories::sqlx_repo::SqlxAdminRepo,
};

#[async_trait]
pub trait AdminRepository: Send + Sync {
    async fn get_admin_by_id(&self, id: &Uuid) -> Result<Option<Admin>, AppError>;
}

#[async_trait]
impl<T> AdminRepository for Arc<T>
where
    T: AdminRepository + ?Sized,
{
    async fn get_admin_by_id(&self, id: &Uuid) -> Result<Option<Admin>, AppError> {
        (**self).get_admin_by_id(id).await
    }
}

impl SqlxAdminRepo {
    pub fn new(pool: sqlx::PgPool) -> Self {
        SqlxAdminRepo { pool }
    }
}

#[async_trait]
impl AdminRepository for SqlxAdminRepo {
    async fn get_admin_by_id(&self, id: &Uuid) -> Result<Option<Admin>, AppError> {
        let row = sqlx::query_as::<_, AdminRow>(
            "SELECT id, name, email, role, is_active, created_at FROM admins WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;

        row.map(Admin::try_from).transpose()
    }
}
