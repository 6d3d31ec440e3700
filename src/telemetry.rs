use tracing_subscriber::EnvFilter;

use crate::settings::{AppConfig, LogFormat};

/// Installs the global fmt subscriber. `RUST_LOG` wins over the configured level.
///
/// Returns an error when a global subscriber is already set, so hosts and tests
/// can call it more than once.
pub fn init_tracing(config: &AppConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    match config.log_format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.try_init(),
    }
}
