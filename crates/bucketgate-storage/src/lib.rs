//! Bucketgate object storage crate
//!
//! Backends that store, fetch and delete objects under sanitized keys, and
//! the registry that maps requested bucket names onto them. Only buckets
//! registered in the [`BucketRegistry`] can be reached.

pub mod error;
pub mod registry;
pub mod storage;

pub use error::{StorageError, StorageResult};
pub use registry::{BucketName, BucketRegistry, ResolvedBucket};
pub use storage::{
    DEFAULT_CONTENT_TYPE, MockStorage, ObjectBody, ObjectStorage, ObjectStoreBackend,
    StoredObject, guess_content_type,
};
