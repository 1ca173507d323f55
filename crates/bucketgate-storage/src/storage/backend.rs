//! [`ObjectStorage`] over the `object_store` crate
//!
//! One backend instance serves one bucket. The memory and S3 backends keep
//! the content type as an object attribute; the local filesystem cannot
//! store attributes, so reads there guess the type from the key's extension.

use crate::storage::traits::{ObjectBody, ObjectStorage, StoredObject, guess_content_type};
use crate::{StorageError, StorageResult};
use async_trait::async_trait;
use bucketgate_config::{StorageBackend, StorageConfig};
use bucketgate_keys::ObjectKey;
use bytes::Bytes;
use object_store::aws::AmazonS3Builder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::path::Path;
use object_store::{
    Attribute, AttributeValue, Attributes, ObjectStore, PutOptions, PutPayload,
};
use std::path::PathBuf;
use std::sync::Arc;

/// Object storage backend for a single bucket
#[derive(Debug, Clone)]
pub struct ObjectStoreBackend {
    bucket: String,
    store: Arc<dyn ObjectStore>,
    kind: StorageBackend,
}

impl ObjectStoreBackend {
    /// Process-memory bucket
    pub fn in_memory(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            store: Arc::new(InMemory::new()),
            kind: StorageBackend::Memory,
        }
    }

    /// Bucket stored under `root/<bucket>`
    ///
    /// # Errors
    /// Returns `StorageError::Configuration` if the directory cannot be created
    pub fn local(root: impl Into<PathBuf>, bucket: impl Into<String>) -> StorageResult<Self> {
        let bucket = bucket.into();
        let dir = root.into().join(&bucket);

        std::fs::create_dir_all(&dir).map_err(|e| {
            StorageError::Configuration(format!(
                "Failed to create bucket directory {}: {e}",
                dir.display()
            ))
        })?;

        let store = LocalFileSystem::new_with_prefix(&dir)
            .map_err(|e| StorageError::Configuration(e.to_string()))?
            .with_automatic_cleanup(true);

        Ok(Self {
            bucket,
            store: Arc::new(store),
            kind: StorageBackend::Local,
        })
    }

    /// Bucket on an S3-compatible service
    ///
    /// Credentials not present in `config` are picked up from the standard
    /// `AWS_*` environment variables.
    ///
    /// # Errors
    /// Returns `StorageError::Configuration` if the client cannot be built
    pub fn s3(config: &StorageConfig, bucket: impl Into<String>) -> StorageResult<Self> {
        let bucket = bucket.into();
        let s3 = &config.s3;

        let mut builder = AmazonS3Builder::from_env()
            .with_bucket_name(&bucket)
            .with_region(&s3.region)
            .with_allow_http(s3.allow_http);

        if let Some(endpoint) = s3.resolved_endpoint() {
            builder = builder.with_endpoint(endpoint);
        }
        if let (Some(access_key_id), Some(secret_access_key)) =
            (&s3.access_key_id, &s3.secret_access_key)
        {
            builder = builder
                .with_access_key_id(access_key_id)
                .with_secret_access_key(secret_access_key);
        }

        let store = builder.build().map_err(|e| {
            StorageError::Configuration(format!("Failed to build S3 client for {bucket}: {e}"))
        })?;

        Ok(Self {
            bucket,
            store: Arc::new(store),
            kind: StorageBackend::S3,
        })
    }

    /// Backend for `bucket` as selected by `config.backend`
    ///
    /// # Errors
    /// Returns `StorageError::Configuration` if the backend cannot be built
    pub fn from_config(config: &StorageConfig, bucket: &str) -> StorageResult<Self> {
        match config.backend {
            StorageBackend::Memory => Ok(Self::in_memory(bucket)),
            StorageBackend::Local => Self::local(&config.local_root, bucket),
            StorageBackend::S3 => Self::s3(config, bucket),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    const fn stores_attributes(&self) -> bool {
        !matches!(self.kind, StorageBackend::Local)
    }

    fn map_err(&self, key: &ObjectKey, err: object_store::Error) -> StorageError {
        StorageError::from_object_store(&self.bucket, key.as_str(), err)
    }
}

fn location(key: &ObjectKey) -> Path {
    Path::from(key.as_str())
}

#[async_trait]
impl ObjectStorage for ObjectStoreBackend {
    async fn put(
        &self,
        key: &ObjectKey,
        body: Bytes,
        content_type: &str,
    ) -> StorageResult<StoredObject> {
        let size = body.len() as u64;

        let mut opts = PutOptions::default();
        if self.stores_attributes() {
            let mut attributes = Attributes::new();
            attributes.insert(
                Attribute::ContentType,
                AttributeValue::from(content_type.to_string()),
            );
            opts.attributes = attributes;
        }

        let result = self
            .store
            .put_opts(&location(key), PutPayload::from(body), opts)
            .await
            .map_err(|e| self.map_err(key, e))?;

        tracing::debug!(
            bucket = %self.bucket,
            key = %key,
            size,
            backend = self.backend_name(),
            "Stored object"
        );

        Ok(StoredObject {
            key: key.as_str().to_string(),
            size,
            content_type: content_type.to_string(),
            e_tag: result.e_tag,
        })
    }

    async fn get(&self, key: &ObjectKey) -> StorageResult<ObjectBody> {
        let result = self
            .store
            .get(&location(key))
            .await
            .map_err(|e| self.map_err(key, e))?;

        let content_type = result
            .attributes
            .get(&Attribute::ContentType)
            .map(|value| AsRef::<str>::as_ref(value).to_string())
            .unwrap_or_else(|| guess_content_type(key.as_str()));
        let size = result.meta.size;

        let bytes = result.bytes().await.map_err(|e| self.map_err(key, e))?;

        Ok(ObjectBody {
            bytes,
            content_type,
            size,
        })
    }

    async fn delete(&self, key: &ObjectKey) -> StorageResult<()> {
        match self.store.delete(&location(key)).await {
            Ok(()) | Err(object_store::Error::NotFound { .. }) => {
                tracing::debug!(bucket = %self.bucket, key = %key, "Deleted object");
                Ok(())
            }
            Err(e) => Err(self.map_err(key, e)),
        }
    }

    async fn exists(&self, key: &ObjectKey) -> StorageResult<bool> {
        match self.store.head(&location(key)).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(self.map_err(key, e)),
        }
    }

    fn backend_name(&self) -> &'static str {
        match self.kind {
            StorageBackend::Memory => "memory",
            StorageBackend::Local => "local",
            StorageBackend::S3 => "s3",
        }
    }
}
