#![allow(dead_code)]

use std::{
    io::Cursor,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use chrono::Utc;
use image::{ImageFormat, Rgb, RgbImage};
use property_portal::{
    db::memory::{InMemoryAdminRepo, InMemoryPropertyRepo},
    entities::{
        admin::{Admin, AdminRole},
        property::{Location, PropertyForm, PropertyStatus, PropertyType, UnitVariant},
        upload::ImageFile,
    },
    errors::StorageError,
    repositories::storage::ObjectStorage,
    settings::{AppConfig, AppEnvironment, StorageBackend, StoreBackend},
    storage::memory::InMemoryStorage,
    AppState, SharedStorage,
};
use uuid::Uuid;

pub struct TestApp {
    pub state: AppState,
    pub config: AppConfig,
    pub property_repo: InMemoryPropertyRepo,
    pub admin_repo: InMemoryAdminRepo,
    pub storage: InMemoryStorage,
    pub admin: Admin,
}

impl TestApp {
    pub fn spawn() -> Self {
        let storage = InMemoryStorage::new();
        Self::build(storage.clone(), Arc::new(storage))
    }

    /// Routes uploads through `storage`, which is expected to wrap `inner`.
    pub fn with_storage(inner: InMemoryStorage, storage: SharedStorage) -> Self {
        Self::build(inner, storage)
    }

    fn build(inner: InMemoryStorage, storage: SharedStorage) -> Self {
        let config = test_config();
        let property_repo = InMemoryPropertyRepo::new();
        let admin_repo = InMemoryAdminRepo::new();

        let admin = test_admin(true);
        admin_repo.insert_admin(admin.clone());

        let state = AppState::from_parts(
            &config,
            Arc::new(property_repo.clone()),
            storage,
            Arc::new(admin_repo.clone()),
        );

        TestApp {
            state,
            config,
            property_repo,
            admin_repo,
            storage: inner,
            admin,
        }
    }

    pub fn add_admin(&self, is_active: bool) -> Admin {
        let admin = test_admin(is_active);
        self.admin_repo.insert_admin(admin.clone());
        admin
    }
}

pub fn test_config() -> AppConfig {
    AppConfig {
        env: AppEnvironment::Testing,
        name: "Property-Portal Test".to_string(),
        store_backend: StoreBackend::Memory,
        storage_backend: StorageBackend::Memory,
        upload_timeout: "300ms".to_string(),
        max_image_width: 800,
        ..AppConfig::default()
    }
}

pub fn test_admin(is_active: bool) -> Admin {
    Admin {
        id: Uuid::new_v4(),
        name: "Test Admin".to_string(),
        email: format!("admin-{}@example.com", Uuid::new_v4()),
        role: AdminRole::Admin,
        is_active,
        created_at: Utc::now(),
    }
}

pub fn sample_form() -> PropertyForm {
    PropertyForm {
        name: "Skyline Residency".to_string(),
        description: Some("Lake facing towers close to the metro".to_string()),
        location: Location::Text("Whitefield, Bangalore".to_string()),
        price: None,
        price_range: None,
        property_type: Some(PropertyType::Apartment),
        land_area: Some("5 acres".to_string()),
        area_sqft: Some(1450.0),
        total_units: Some("320".to_string()),
        towers: Some("4".to_string()),
        possession: Some("Dec 2027".to_string()),
        bedrooms: Some(3),
        bathrooms: Some(2),
        unit_variants: vec![UnitVariant {
            variant: "3 BHK".to_string(),
            sqft: "1450".to_string(),
            pricing: "₹1.2 Cr".to_string(),
        }],
        amenities: vec!["Swimming Pool".to_string(), "Gym".to_string()],
        status: PropertyStatus::Ongoing,
        is_featured: false,
        is_active: true,
        developer: None,
    }
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 128]));
    let mut buffer = Cursor::new(Vec::new());
    img.write_to(&mut buffer, ImageFormat::Png)
        .expect("Failed to encode test image");
    buffer.into_inner()
}

pub fn png_image(name: &str, width: u32, height: u32) -> ImageFile {
    ImageFile::new(name, png_bytes(width, height))
}

/// Storage double that fails or stalls uploads whose key ends with a given file name.
/// With `stall_deletes` set, every delete hangs for `stall_for` before reaching `inner`.
pub struct ScriptedStorage {
    pub inner: InMemoryStorage,
    pub failing: Vec<String>,
    pub stalling: Vec<String>,
    pub stall_for: Duration,
    pub stall_deletes: bool,
    pub attempts: AtomicUsize,
}

impl ScriptedStorage {
    pub fn new(inner: InMemoryStorage) -> Self {
        ScriptedStorage {
            inner,
            failing: Vec::new(),
            stalling: Vec::new(),
            stall_for: Duration::from_secs(5),
            stall_deletes: false,
            attempts: AtomicUsize::new(0),
        }
    }

    pub fn failing(mut self, file_name: &str) -> Self {
        self.failing.push(format!("_{}", file_name));
        self
    }

    pub fn stalling(mut self, file_name: &str) -> Self {
        self.stalling.push(format!("_{}", file_name));
        self
    }

    pub fn stalling_deletes(mut self) -> Self {
        self.stall_deletes = true;
        self
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectStorage for ScriptedStorage {
    async fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<String, StorageError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        if self.stalling.iter().any(|suffix| key.ends_with(suffix)) {
            tokio::time::sleep(self.stall_for).await;
        }
        if self.failing.iter().any(|suffix| key.ends_with(suffix)) {
            return Err(StorageError::Status {
                status: 403,
                body: "permission denied".to_string(),
            });
        }
        self.inner.put(key, bytes, content_type).await
    }

    async fn delete(&self, url: &str) -> Result<(), StorageError> {
        if self.stall_deletes {
            tokio::time::sleep(self.stall_for).await;
        }
        self.inner.delete(url).await
    }
}
