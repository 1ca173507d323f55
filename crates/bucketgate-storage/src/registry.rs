//! Bucket allow-list
//!
//! Requests name buckets by string. Only names registered here resolve to
//! a backend; everything else is rejected before any storage call.

use crate::storage::{ObjectStorage, ObjectStoreBackend};
use crate::{StorageError, StorageResult};
use bucketgate_config::StorageConfig;
use bucketgate_config::validation::is_valid_bucket_name;
use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A validated bucket identifier
///
/// Lowercase ASCII letters, digits, `-` and `_`, starting with a letter or
/// digit, at most 63 characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BucketName(String);

impl BucketName {
    /// # Errors
    /// Returns `StorageError::InvalidBucketName` if `name` is not acceptable
    pub fn parse(name: &str) -> StorageResult<Self> {
        if is_valid_bucket_name(name) {
            Ok(Self(name.to_string()))
        } else {
            Err(StorageError::InvalidBucketName {
                name: name.to_string(),
            })
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BucketName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for BucketName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for BucketName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// A bucket a request resolved to
#[derive(Clone)]
pub struct ResolvedBucket {
    pub name: BucketName,
    pub storage: Arc<dyn ObjectStorage>,
}

impl fmt::Debug for ResolvedBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedBucket")
            .field("name", &self.name)
            .field("backend", &self.storage.backend_name())
            .finish()
    }
}

/// Registered buckets and the optional default
#[derive(Clone, Default)]
pub struct BucketRegistry {
    buckets: BTreeMap<BucketName, Arc<dyn ObjectStorage>>,
    default_bucket: Option<BucketName>,
}

impl BucketRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build one backend per configured bucket
    ///
    /// # Errors
    /// Returns an error if a bucket name is invalid, the default bucket is
    /// not listed, or a backend cannot be built
    pub fn from_config(config: &StorageConfig) -> StorageResult<Self> {
        let mut registry = Self::new();
        for bucket in &config.buckets {
            let name = BucketName::parse(bucket)?;
            let backend = ObjectStoreBackend::from_config(config, name.as_str())?;
            registry.register(name, Arc::new(backend));
        }

        if let Some(default_bucket) = &config.default_bucket {
            registry.set_default(default_bucket)?;
        }

        tracing::info!(
            backend = %config.backend,
            buckets = ?registry.names().collect::<Vec<_>>(),
            default_bucket = ?registry.default_bucket().map(BucketName::as_str),
            "Bucket registry ready"
        );

        Ok(registry)
    }

    /// Add or replace a bucket
    pub fn register(&mut self, name: BucketName, storage: Arc<dyn ObjectStorage>) {
        self.buckets.insert(name, storage);
    }

    /// Builder form of [`register`](Self::register)
    ///
    /// # Errors
    /// Returns `StorageError::InvalidBucketName` if `name` is not acceptable
    pub fn with_bucket(
        mut self,
        name: &str,
        storage: Arc<dyn ObjectStorage>,
    ) -> StorageResult<Self> {
        self.register(BucketName::parse(name)?, storage);
        Ok(self)
    }

    /// Make `name` the bucket used when a request names none
    ///
    /// # Errors
    /// Returns `StorageError::UnknownBucket` if `name` is not registered
    pub fn set_default(&mut self, name: &str) -> StorageResult<()> {
        let name = self.lookup(name)?.0.clone();
        self.default_bucket = Some(name);
        Ok(())
    }

    /// Builder form of [`set_default`](Self::set_default)
    ///
    /// # Errors
    /// Returns `StorageError::UnknownBucket` if `name` is not registered
    pub fn with_default(mut self, name: &str) -> StorageResult<Self> {
        self.set_default(name)?;
        Ok(self)
    }

    /// Map a requested bucket name onto a registered backend
    ///
    /// `None`, empty and whitespace-only names select the default bucket.
    ///
    /// # Errors
    /// Returns `StorageError::UnknownBucket` for any name that is not
    /// registered and `StorageError::MissingBucket` when no name is given and
    /// there is no default
    pub fn resolve(&self, requested: Option<&str>) -> StorageResult<ResolvedBucket> {
        let requested = requested.map(str::trim).filter(|name| !name.is_empty());

        let (name, storage) = match requested {
            Some(name) => self.lookup(name)?,
            None => {
                let name = self
                    .default_bucket
                    .as_ref()
                    .ok_or(StorageError::MissingBucket)?;
                self.lookup(name.as_str())?
            }
        };

        Ok(ResolvedBucket {
            name: name.clone(),
            storage: Arc::clone(storage),
        })
    }

    fn lookup(&self, name: &str) -> StorageResult<(&BucketName, &Arc<dyn ObjectStorage>)> {
        self.buckets
            .get_key_value(name)
            .ok_or_else(|| StorageError::UnknownBucket {
                name: name.to_string(),
            })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.buckets.keys().map(BucketName::as_str)
    }

    pub const fn default_bucket(&self) -> Option<&BucketName> {
        self.default_bucket.as_ref()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.buckets.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

impl fmt::Debug for BucketRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BucketRegistry")
            .field("buckets", &self.names().collect::<Vec<_>>())
            .field("default_bucket", &self.default_bucket)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MockStorage;

    fn registry() -> BucketRegistry {
        BucketRegistry::new()
            .with_bucket("photos", Arc::new(MockStorage::new("photos")))
            .unwrap()
            .with_bucket("documents", Arc::new(MockStorage::new("documents")))
            .unwrap()
    }

    #[test]
    fn test_bucket_name_validation() {
        assert!(BucketName::parse("photos").is_ok());
        assert!(matches!(
            BucketName::parse("UPLOAD_SECRET"),
            Err(StorageError::InvalidBucketName { .. })
        ));
        assert!(BucketName::parse("../etc").is_err());
    }

    #[test]
    fn test_resolves_registered_buckets_only() {
        let registry = registry();

        assert_eq!(
            registry.resolve(Some("photos")).unwrap().name.as_str(),
            "photos"
        );
        assert!(matches!(
            registry.resolve(Some("secrets")),
            Err(StorageError::UnknownBucket { ref name }) if name == "secrets"
        ));
        // binding-like names that are not buckets never resolve
        assert!(matches!(
            registry.resolve(Some("UPLOAD_SECRET")),
            Err(StorageError::UnknownBucket { .. })
        ));
    }

    #[test]
    fn test_missing_name_without_default() {
        let registry = registry();
        assert!(matches!(
            registry.resolve(None),
            Err(StorageError::MissingBucket)
        ));
        assert!(matches!(
            registry.resolve(Some("  ")),
            Err(StorageError::MissingBucket)
        ));
    }

    #[test]
    fn test_missing_name_uses_default() {
        let registry = registry().with_default("documents").unwrap();
        assert_eq!(registry.resolve(None).unwrap().name.as_str(), "documents");
        assert_eq!(registry.resolve(Some("")).unwrap().name.as_str(), "documents");
        assert_eq!(
            registry.resolve(Some("photos")).unwrap().name.as_str(),
            "photos"
        );
    }

    #[test]
    fn test_default_must_be_registered() {
        assert!(matches!(
            registry().with_default("videos"),
            Err(StorageError::UnknownBucket { .. })
        ));
    }

    #[test]
    fn test_from_config_builds_memory_backends() {
        let config = StorageConfig {
            buckets: vec!["photos".to_string(), "documents".to_string()],
            default_bucket: Some("photos".to_string()),
            ..StorageConfig::default()
        };

        let registry = BucketRegistry::from_config(&config).unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["documents", "photos"]);
        assert_eq!(registry.default_bucket().unwrap().as_str(), "photos");
        assert_eq!(
            registry.resolve(None).unwrap().storage.backend_name(),
            "memory"
        );
    }

    #[test]
    fn test_from_config_rejects_invalid_names() {
        let config = StorageConfig {
            buckets: vec!["Bad Name".to_string()],
            default_bucket: None,
            ..StorageConfig::default()
        };

        assert!(matches!(
            BucketRegistry::from_config(&config),
            Err(StorageError::InvalidBucketName { .. })
        ));
    }
}
