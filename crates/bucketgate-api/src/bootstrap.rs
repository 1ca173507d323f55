//! Application bootstrap and service initialization
//!
//! Configuration loading, logging setup and registry construction live here
//! so `main` only parses arguments and serves.

use crate::{AppState, routes};
use axum::Router;
use bucketgate_config::source::{ConfigurationLoader, EnvironmentSource, TomlFileSource};
use bucketgate_config::{ApplicationConfig, TelemetryConfig};
use bucketgate_storage::BucketRegistry;
use std::path::Path;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Bootstrap result type
pub type BootstrapResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Load configuration: optional TOML file, then environment overrides
///
/// # Errors
///
/// Returns error if the file cannot be read or the result fails validation
pub fn load_configuration(config_path: Option<&Path>) -> BootstrapResult<ApplicationConfig> {
    let mut loader = ConfigurationLoader::new().add_source(Box::new(EnvironmentSource));
    if let Some(path) = config_path {
        loader = loader.add_source(Box::new(TomlFileSource::new(path)));
    }
    Ok(loader.load()?)
}

/// Install the global tracing subscriber
///
/// `RUST_LOG` wins over the configured level when set.
///
/// # Errors
///
/// Returns error if a subscriber is already installed
pub fn init_tracing(telemetry: &TelemetryConfig) -> BootstrapResult<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(telemetry.tracing_level.to_lowercase()));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if telemetry.json_logs {
        builder.json().try_init()?;
    } else {
        builder.try_init()?;
    }
    Ok(())
}

/// Build the bucket registry from configuration
///
/// # Errors
///
/// Returns error if a bucket backend cannot be built
pub fn setup_registry(config: &ApplicationConfig) -> BootstrapResult<BucketRegistry> {
    info!(backend = %config.storage.backend, "Initializing bucket registry...");
    Ok(BucketRegistry::from_config(&config.storage)?)
}

/// Build the application router for a loaded configuration
///
/// # Errors
///
/// Returns error if the registry or application state cannot be built
pub fn build_app(config: &ApplicationConfig) -> BootstrapResult<Router> {
    let registry = setup_registry(config)?;
    let state = AppState::from_config(config, registry)?;

    if !config.auth.is_configured() {
        warn!(
            "No upload secret configured - set BUCKETGATE_UPLOAD_SECRET. Every upload, delete and download request will be rejected!"
        );
    }
    if state.public_urls.is_none() {
        info!("No public base URL configured; upload responses will omit publicUrl");
    }

    Ok(routes::create_router(state, &config.server))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_app_from_defaults() {
        let config = ApplicationConfig::default();
        assert!(build_app(&config).is_ok());
    }

    #[test]
    fn test_build_app_rejects_bad_auth_header() {
        let mut config = ApplicationConfig::default();
        config.auth.header_name = "not a header".to_string();
        assert!(build_app(&config).is_err());
    }
}
