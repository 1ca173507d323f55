//! Storage abstraction traits for object storage backends
//!
//! Every backend works in terms of [`ObjectKey`]s, so only keys that went
//! through the sanitizer can reach a bucket.

use crate::StorageResult;
use async_trait::async_trait;
use bucketgate_keys::ObjectKey;
use bytes::Bytes;

/// Content type used when neither the client nor the key's extension says
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Result of a successful put
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Key the object was written under
    pub key: String,
    /// Size in bytes
    pub size: u64,
    pub content_type: String,
    /// Backend entity tag, when the backend reports one
    pub e_tag: Option<String>,
}

/// Object contents returned by a get
#[derive(Debug, Clone)]
pub struct ObjectBody {
    pub bytes: Bytes,
    pub content_type: String,
    pub size: u64,
}

/// Trait for object storage backends bound to one bucket
///
/// Implementations must be safe to share across request tasks.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Write `body` under `key`, replacing any existing object
    async fn put(
        &self,
        key: &ObjectKey,
        body: Bytes,
        content_type: &str,
    ) -> StorageResult<StoredObject>;

    /// Read the object stored under `key`
    ///
    /// Returns `StorageError::NotFound` when there is none.
    async fn get(&self, key: &ObjectKey) -> StorageResult<ObjectBody>;

    /// Remove the object stored under `key`
    ///
    /// Deleting a missing object succeeds.
    async fn delete(&self, key: &ObjectKey) -> StorageResult<()>;

    /// Check whether an object exists under `key`
    async fn exists(&self, key: &ObjectKey) -> StorageResult<bool>;

    /// Backend type (e.g., "memory", "local", "s3")
    fn backend_name(&self) -> &'static str;
}

/// Content type for `key` guessed from its extension
pub fn guess_content_type(key: &str) -> String {
    mime_guess::from_path(key)
        .first()
        .map_or_else(|| DEFAULT_CONTENT_TYPE.to_string(), |mime| mime.to_string())
}
