//! Mock implementation of `ObjectStorage` for testing
//!
//! Stores objects in a shared map and can be told to fail individual
//! operations, so callers can exercise their error paths without a backend.

use crate::storage::traits::{ObjectBody, ObjectStorage, StoredObject};
use crate::{StorageError, StorageResult};
use async_trait::async_trait;
use bucketgate_keys::ObjectKey;
use bytes::Bytes;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

type ObjectMap = Arc<Mutex<BTreeMap<String, MockObject>>>;

/// Object as held by [`MockStorage`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockObject {
    pub bytes: Bytes,
    pub content_type: String,
}

/// Mock storage backend for testing
#[derive(Debug, Clone)]
pub struct MockStorage {
    bucket: String,
    objects: ObjectMap,
    fail_on_put: bool,
    fail_on_get: bool,
    fail_on_delete: bool,
    latency: Option<Duration>,
}

impl MockStorage {
    /// Create a new mock storage instance for `bucket`
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            objects: Arc::new(Mutex::new(BTreeMap::new())),
            fail_on_put: false,
            fail_on_get: false,
            fail_on_delete: false,
            latency: None,
        }
    }

    /// Configure to fail on put operations
    #[must_use]
    pub const fn with_put_failure(mut self) -> Self {
        self.fail_on_put = true;
        self
    }

    /// Configure to fail on get and exists operations
    #[must_use]
    pub const fn with_get_failure(mut self) -> Self {
        self.fail_on_get = true;
        self
    }

    /// Configure to fail on delete operations
    #[must_use]
    pub const fn with_delete_failure(mut self) -> Self {
        self.fail_on_delete = true;
        self
    }

    /// Delay every operation by `latency` before it runs
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Seed an object directly (for test setup)
    pub fn insert(&self, key: &str, bytes: impl Into<Bytes>, content_type: &str) {
        self.lock().insert(
            key.to_string(),
            MockObject {
                bytes: bytes.into(),
                content_type: content_type.to_string(),
            },
        );
    }

    /// Get a stored object by raw key (for test assertions)
    pub fn object(&self, key: &str) -> Option<MockObject> {
        self.lock().get(key).cloned()
    }

    /// Every stored key in order (for test assertions)
    pub fn keys(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, MockObject>> {
        self.objects.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn simulate_latency(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn injected_failure(&self, operation: &str) -> StorageError {
        StorageError::Backend {
            bucket: self.bucket.clone(),
            message: format!("Mock storage configured to fail on {operation}"),
        }
    }
}

#[async_trait]
impl ObjectStorage for MockStorage {
    async fn put(
        &self,
        key: &ObjectKey,
        body: Bytes,
        content_type: &str,
    ) -> StorageResult<StoredObject> {
        self.simulate_latency().await;
        if self.fail_on_put {
            return Err(self.injected_failure("put"));
        }

        let size = body.len() as u64;
        self.insert(key.as_str(), body, content_type);

        Ok(StoredObject {
            key: key.as_str().to_string(),
            size,
            content_type: content_type.to_string(),
            e_tag: None,
        })
    }

    async fn get(&self, key: &ObjectKey) -> StorageResult<ObjectBody> {
        self.simulate_latency().await;
        if self.fail_on_get {
            return Err(self.injected_failure("get"));
        }

        let object = self.object(key.as_str()).ok_or_else(|| StorageError::NotFound {
            bucket: self.bucket.clone(),
            key: key.as_str().to_string(),
        })?;

        Ok(ObjectBody {
            size: object.bytes.len() as u64,
            bytes: object.bytes,
            content_type: object.content_type,
        })
    }

    async fn delete(&self, key: &ObjectKey) -> StorageResult<()> {
        self.simulate_latency().await;
        if self.fail_on_delete {
            return Err(self.injected_failure("delete"));
        }

        self.lock().remove(key.as_str());
        Ok(())
    }

    async fn exists(&self, key: &ObjectKey) -> StorageResult<bool> {
        self.simulate_latency().await;
        if self.fail_on_get {
            return Err(self.injected_failure("exists"));
        }

        Ok(self.lock().contains_key(key.as_str()))
    }

    fn backend_name(&self) -> &'static str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bucketgate_keys::{SanitizePolicy, sanitize};

    fn key(name: &str) -> ObjectKey {
        ObjectKey::compose(
            None,
            &sanitize(name, &SanitizePolicy::file_name()).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_clones_share_objects() {
        let storage = MockStorage::new("photos");
        let handle = storage.clone();

        storage
            .put(&key("a.txt"), Bytes::from_static(b"hi"), "text/plain")
            .await
            .unwrap();

        assert_eq!(handle.keys(), vec!["a.txt"]);
        assert_eq!(
            handle.object("a.txt").unwrap().content_type,
            "text/plain"
        );
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let storage = MockStorage::new("photos")
            .with_put_failure()
            .with_delete_failure();

        let put = storage
            .put(&key("a.txt"), Bytes::new(), "text/plain")
            .await;
        assert!(matches!(put, Err(StorageError::Backend { .. })));
        assert!(storage.is_empty());

        assert!(storage.delete(&key("a.txt")).await.is_err());
        assert!(matches!(
            storage.get(&key("a.txt")).await,
            Err(StorageError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_latency_delays_operations() {
        let storage = MockStorage::new("photos").with_latency(Duration::from_millis(50));
        let started = std::time::Instant::now();

        storage
            .put(&key("a.txt"), Bytes::from_static(b"hi"), "text/plain")
            .await
            .unwrap();

        assert!(started.elapsed() >= Duration::from_millis(50));
        assert_eq!(storage.len(), 1);
    }
}
