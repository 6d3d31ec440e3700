use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use dotenv::dotenv;
use std::{env, fmt, str::FromStr, time::Duration};
use zeroize::Zeroizing;

use crate::constants::DEFAULT_COLLECTION;

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum AppEnvironment {
    Development,
    Production,
    Testing,
}

impl FromStr for AppEnvironment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" => Ok(AppEnvironment::Development),
            "production" => Ok(AppEnvironment::Production),
            "testing" => Ok(AppEnvironment::Testing),
            _ => Err(ConfigError::Message(format!("Invalid environment: {}", s))),
        }
    }
}

/// Where property documents live.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Postgres,
    Memory,
}

/// Where uploaded image blobs live.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Firebase,
    Local,
    Memory,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Deserialize, Clone)]
#[serde(rename_all = "snake_case")]
pub struct AppConfig {
    #[serde(default = "default_env")]
    pub env: AppEnvironment,

    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_log_format")]
    pub log_format: LogFormat,

    #[serde(default = "default_store_backend")]
    pub store_backend: StoreBackend,

    #[serde(default)]
    pub database_url: String,

    #[serde(default = "default_storage_backend")]
    pub storage_backend: StorageBackend,

    #[serde(default)]
    pub firebase_bucket: String,

    #[serde(default = "default_firebase_endpoint")]
    pub firebase_endpoint: String,

    #[serde(default)]
    pub storage_token: Option<Zeroizing<String>>,

    #[serde(default = "default_media_root")]
    pub media_root: String,

    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,

    #[serde(default = "default_collection")]
    pub properties_collection: String,

    #[serde(default = "default_upload_timeout")]
    pub upload_timeout: String,

    #[serde(default = "default_max_image_width")]
    pub max_image_width: u32,

    #[serde(default = "default_image_quality")]
    pub image_quality: f32,

    #[serde(default = "default_true")]
    pub verify_writes: bool,
}

fn default_env() -> AppEnvironment {
    AppEnvironment::Development
}
fn default_name() -> String {
    "Property-Portal".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> LogFormat {
    LogFormat::Pretty
}
fn default_store_backend() -> StoreBackend {
    StoreBackend::Postgres
}
fn default_storage_backend() -> StorageBackend {
    StorageBackend::Local
}
fn default_firebase_endpoint() -> String {
    "https://firebasestorage.googleapis.com".to_string()
}
fn default_media_root() -> String {
    "./media".to_string()
}
fn default_public_base_url() -> String {
    "http://127.0.0.1:8080/media".to_string()
}
fn default_collection() -> String {
    DEFAULT_COLLECTION.to_string()
}
fn default_upload_timeout() -> String {
    "30s".to_string()
}
fn default_max_image_width() -> u32 {
    1200
}
fn default_image_quality() -> f32 {
    0.8
}
fn default_true() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            env: default_env(),
            name: default_name(),
            log_level: default_log_level(),
            log_format: default_log_format(),
            store_backend: default_store_backend(),
            database_url: String::new(),
            storage_backend: default_storage_backend(),
            firebase_bucket: String::new(),
            firebase_endpoint: default_firebase_endpoint(),
            storage_token: None,
            media_root: default_media_root(),
            public_base_url: default_public_base_url(),
            properties_collection: default_collection(),
            upload_timeout: default_upload_timeout(),
            max_image_width: default_max_image_width(),
            image_quality: default_image_quality(),
            verify_writes: default_true(),
        }
    }
}

impl AppConfig {
    pub fn new() -> Result<Self, ConfigError> {
        dotenv().ok();

        let raw_env = env::var("APP_ENV").unwrap_or_else(|_| "development".into());
        let env_name = AppEnvironment::from_str(&raw_env)
            .map_err(|_| ConfigError::Message(format!("Invalid APP_ENV value: {}", raw_env)))?;

        let builder = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env_name)).required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .try_parsing(true)
                    .ignore_empty(true)
            );

        let mut config: Self = builder.build()?.try_deserialize()?;

        config.env = env_name;

        if config.store_backend == StoreBackend::Postgres {
            config.database_url = fill_or_env(config.database_url, "DATABASE_URL")?;
        }
        if config.storage_token.is_none() {
            config.storage_token = env::var("APP_STORAGE_TOKEN").ok().map(Zeroizing::new);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.store_backend == StoreBackend::Postgres && self.database_url.trim().is_empty() {
            errors.push("DATABASE_URL cannot be empty".to_string());
        }
        match self.storage_backend {
            StorageBackend::Firebase => {
                if self.firebase_bucket.trim().is_empty() {
                    errors.push("FIREBASE_BUCKET cannot be empty".to_string());
                }
                if url::Url::parse(&self.firebase_endpoint).is_err() {
                    errors.push("FIREBASE_ENDPOINT must be a valid URL".to_string());
                }
                if self.is_production() && self.storage_token.is_none() {
                    errors.push("STORAGE_TOKEN is required in production".to_string());
                }
            }
            StorageBackend::Local => {
                if self.media_root.trim().is_empty() {
                    errors.push("MEDIA_ROOT cannot be empty".to_string());
                }
                if url::Url::parse(&self.public_base_url).is_err() {
                    errors.push("PUBLIC_BASE_URL must be a valid URL".to_string());
                }
            }
            StorageBackend::Memory => {
                if self.is_production() {
                    errors.push("In-memory storage is not allowed in production".to_string());
                }
            }
        }
        if self.properties_collection.trim().is_empty() || self.properties_collection.contains('/') {
            errors.push("PROPERTIES_COLLECTION must be a single non-empty path segment".to_string());
        }
        match humantime::parse_duration(&self.upload_timeout) {
            Ok(timeout) if timeout.is_zero() => {
                errors.push("UPLOAD_TIMEOUT must be greater than zero".to_string());
            }
            Ok(_) => {}
            Err(e) => errors.push(format!("UPLOAD_TIMEOUT is not a valid duration: {}", e)),
        }
        if !(100..=4096).contains(&self.max_image_width) {
            errors.push("MAX_IMAGE_WIDTH must be between 100 and 4096".to_string());
        }
        if !(0.1..=1.0).contains(&self.image_quality) {
            errors.push("IMAGE_QUALITY must be between 0.1 and 1.0".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Message(errors.join(", ")))
        }
    }

    pub fn is_production(&self) -> bool {
        self.env == AppEnvironment::Production
    }

    /// Per-file upload bound. Falls back to 30s when the configured value does not parse.
    pub fn upload_timeout(&self) -> Duration {
        humantime::parse_duration(&self.upload_timeout).unwrap_or(Duration::from_secs(30))
    }

    /// JPEG quality as a 1..=100 percentage.
    pub fn jpeg_quality(&self) -> u8 {
        (self.image_quality.clamp(0.01, 1.0) * 100.0).round() as u8
    }

    pub fn storage_token(&self) -> Option<Zeroizing<String>> {
        self.storage_token.clone()
    }
}

fn fill_or_env(current: String, env_key: &str) -> Result<String, ConfigError> {
    if current.trim().is_empty() {
        env::var(env_key).map_err(|_| ConfigError::Message(format!("{env_key} must be set")))
    } else {
        Ok(current)
    }
}

impl fmt::Display for AppEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AppEnvironment::Development => "development",
            AppEnvironment::Production => "production",
            AppEnvironment::Testing => "testing",
        };
        write!(f, "{s}")
    }
}

trait Redact {
    fn redact(&self) -> &str;
}

impl Redact for str {
    fn redact(&self) -> &str {
        if self.is_empty() {
            "[MISSING]"
        } else {
            "[REDACTED]"
        }
    }
}

impl Redact for String {
    fn redact(&self) -> &str {
        self.as_str().redact()
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("name", &self.name)
            .field("log_level", &self.log_level)
            .field("log_format", &self.log_format)
            .field("store_backend", &self.store_backend)
            .field("database_url", &self.database_url.redact())
            .field("storage_backend", &self.storage_backend)
            .field("firebase_bucket", &self.firebase_bucket)
            .field("firebase_endpoint", &self.firebase_endpoint)
            .field("storage_token", &self.storage_token.as_deref().map(|t| t.redact()))
            .field("media_root", &self.media_root)
            .field("public_base_url", &self.public_base_url)
            .field("properties_collection", &self.properties_collection)
            .field("upload_timeout", &self.upload_timeout)
            .field("max_image_width", &self.max_image_width)
            .field("image_quality", &self.image_quality)
            .field("verify_writes", &self.verify_writes)
            .finish()
    }
}
