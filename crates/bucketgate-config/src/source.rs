//! Configuration source loading and composition

use crate::validation::Validate;
use crate::{ApplicationConfig, ConfigResult};
use std::path::{Path, PathBuf};

/// A layer of configuration applied on top of what lower layers produced
pub trait ConfigurationSource {
    /// Apply this source to `base`
    ///
    /// # Errors
    /// Returns configuration loading errors
    fn apply(&self, base: ApplicationConfig) -> ConfigResult<ApplicationConfig>;

    /// Get the name of this configuration source
    fn name(&self) -> &str;

    /// Get the priority of this source (higher number = higher priority)
    fn priority(&self) -> u8;
}

/// Environment variables override individual fields
pub struct EnvironmentSource;

impl ConfigurationSource for EnvironmentSource {
    fn apply(&self, base: ApplicationConfig) -> ConfigResult<ApplicationConfig> {
        Ok(base.with_env_overrides())
    }

    fn name(&self) -> &'static str {
        "environment"
    }

    fn priority(&self) -> u8 {
        100 // Environment variables override everything
    }
}

/// A TOML file replaces the defaults; absent sections keep their defaults
pub struct TomlFileSource {
    path: PathBuf,
}

impl TomlFileSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl ConfigurationSource for TomlFileSource {
    fn apply(&self, _base: ApplicationConfig) -> ConfigResult<ApplicationConfig> {
        let content = std::fs::read_to_string(&self.path)?;
        let config: ApplicationConfig = toml::from_str(&content)?;
        Ok(config)
    }

    fn name(&self) -> &'static str {
        "toml_file"
    }

    fn priority(&self) -> u8 {
        50
    }
}

/// Configuration loader that combines multiple sources
pub struct ConfigurationLoader {
    sources: Vec<Box<dyn ConfigurationSource>>,
}

impl ConfigurationLoader {
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    #[must_use]
    pub fn add_source(mut self, source: Box<dyn ConfigurationSource>) -> Self {
        self.sources.push(source);
        self
    }

    /// Apply every source in priority order, then validate
    ///
    /// A source that fails to load aborts the whole load.
    ///
    /// # Errors
    /// Returns configuration loading or validation errors
    pub fn load(&self) -> ConfigResult<ApplicationConfig> {
        let mut sorted_sources = self.sources.iter().collect::<Vec<_>>();
        sorted_sources.sort_by_key(|source| source.priority());

        let mut config = ApplicationConfig::default();
        for source in sorted_sources {
            config = source.apply(config).inspect_err(|e| {
                tracing::error!("Failed to load from source {}: {e}", source.name());
            })?;
            tracing::debug!("Loaded configuration from source: {}", source.name());
        }

        config.validate()?;
        Ok(config)
    }
}

impl Default for ConfigurationLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ConfigError;
    use std::io::Write;

    fn write_toml(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_toml_source_loads_buckets() {
        let file = write_toml(
            r#"
            [storage]
            buckets = ["photos", "documents"]
            default_bucket = "photos"

            [keys]
            max_length = 120
            "#,
        );

        let config = ConfigurationLoader::new()
            .add_source(Box::new(TomlFileSource::new(file.path())))
            .load()
            .unwrap();

        assert_eq!(config.storage.buckets, vec!["photos", "documents"]);
        assert_eq!(config.keys.max_length, 120);
    }

    #[test]
    fn test_environment_overrides_toml_field_by_field() {
        let file = write_toml(
            r#"
            [keys]
            max_length = 120
            allow_brackets = false
            "#,
        );
        unsafe {
            std::env::set_var("BUCKETGATE_KEYS_MAX_LENGTH", "64");
        }

        let config = ConfigurationLoader::new()
            .add_source(Box::new(EnvironmentSource))
            .add_source(Box::new(TomlFileSource::new(file.path())))
            .load();

        unsafe {
            std::env::remove_var("BUCKETGATE_KEYS_MAX_LENGTH");
        }

        let config = config.unwrap();
        assert_eq!(config.keys.max_length, 64);
        assert!(!config.keys.allow_brackets);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let result = ConfigurationLoader::new()
            .add_source(Box::new(TomlFileSource::new("/nonexistent/bucketgate.toml")))
            .load();

        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_malformed_toml_is_an_error() {
        let file = write_toml("[storage\nbuckets = 3");

        let result = ConfigurationLoader::new()
            .add_source(Box::new(TomlFileSource::new(file.path())))
            .load();

        assert!(matches!(result, Err(ConfigError::TomlParsing(_))));
    }

    #[test]
    fn test_loaded_config_is_validated() {
        let file = write_toml(
            r#"
            [storage]
            buckets = ["photos"]
            default_bucket = "videos"
            "#,
        );

        let result = ConfigurationLoader::new()
            .add_source(Box::new(TomlFileSource::new(file.path())))
            .load();

        assert!(result.is_err());
    }
}
