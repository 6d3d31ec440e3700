use std::sync::Arc;

mod domain;
mod interfaces;
mod infrastructure;
pub mod errors;
pub mod settings;
pub mod constants;
pub mod telemetry;

pub use domain::{entities, use_cases};
pub use interfaces::repositories;
pub use infrastructure::{db, imaging, storage, utils};

use db::{
    memory::{InMemoryAdminRepo, InMemoryPropertyRepo},
    postgres::{create_pool, run_migrations},
};
use errors::AppError;
use imaging::compressor::ImageCompressor;
use repositories::{
    admin::AdminRepository,
    property::PropertyRepository,
    sqlx_repo::{SqlxAdminRepo, SqlxPropertyRepo},
    storage::ObjectStorage,
};
use settings::{AppConfig, StorageBackend, StoreBackend};
use storage::{firebase::FirebaseStorage, local::LocalStorage, memory::InMemoryStorage};
use use_cases::{
    persistence::PersistenceWriter, properties::PropertyHandler,
    submission::PropertySubmissionHandler, upload::ParallelUploader,
};

pub type SharedPropertyRepo = Arc<dyn PropertyRepository>;
pub type SharedStorage = Arc<dyn ObjectStorage>;
pub type SharedAdminRepo = Arc<dyn AdminRepository>;

pub type AppSubmissionHandler = PropertySubmissionHandler<SharedPropertyRepo, SharedStorage, SharedAdminRepo>;
pub type AppPropertyHandler = PropertyHandler<SharedPropertyRepo, SharedStorage>;

pub struct AppState {
    pub submission_handler: AppSubmissionHandler,
    pub property_handler: AppPropertyHandler,
}

impl AppState {
    /// Connects the configured store and storage backends.
    pub async fn new(config: &AppConfig) -> Result<Self, AppError> {
        let (property_repo, admin_repo): (SharedPropertyRepo, SharedAdminRepo) = match config.store_backend {
            StoreBackend::Postgres => {
                let pool = create_pool(&config.database_url).await?;
                run_migrations(&pool).await?;
                (
                    Arc::new(SqlxPropertyRepo::new(pool.clone())),
                    Arc::new(SqlxAdminRepo::new(pool)),
                )
            }
            StoreBackend::Memory => (
                Arc::new(InMemoryPropertyRepo::new()),
                Arc::new(InMemoryAdminRepo::new()),
            ),
        };

        let storage: SharedStorage = match config.storage_backend {
            StorageBackend::Firebase => Arc::new(FirebaseStorage::from_config(config)),
            StorageBackend::Local => Arc::new(LocalStorage::from_config(config)),
            StorageBackend::Memory => Arc::new(InMemoryStorage::new()),
        };

        property_repo.check_connection().await?;
        tracing::info!(
            store = ?config.store_backend,
            storage = ?config.storage_backend,
            "Application state initialized"
        );

        Ok(Self::from_parts(config, property_repo, storage, admin_repo))
    }

    /// Wires handlers around already constructed backends.
    pub fn from_parts(
        config: &AppConfig,
        property_repo: SharedPropertyRepo,
        storage: SharedStorage,
        admin_repo: SharedAdminRepo,
    ) -> Self {
        let submission_handler = PropertySubmissionHandler::new(
            PersistenceWriter::new(property_repo.clone(), config.verify_writes),
            ParallelUploader::new(storage.clone(), config.upload_timeout()),
            admin_repo,
            ImageCompressor::from_config(config),
            config.properties_collection.clone(),
        );
        let property_handler = PropertyHandler::new(property_repo, storage, config.upload_timeout());

        AppState {
            submission_handler,
            property_handler,
        }
    }
}
