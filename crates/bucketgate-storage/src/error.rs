//! Error types for object storage operations

use thiserror::Error;

/// Result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur while resolving buckets or touching objects
#[derive(Error, Debug)]
pub enum StorageError {
    /// The object does not exist
    #[error("Object not found: {bucket}/{key}")]
    NotFound { bucket: String, key: String },

    /// The request named a bucket that is not registered
    #[error("Unknown bucket: {name}")]
    UnknownBucket { name: String },

    /// The request named no bucket and there is no default
    #[error("No bucket specified and no default bucket configured")]
    MissingBucket,

    /// A bucket name outside the accepted character set
    #[error("Invalid bucket name: {name}")]
    InvalidBucketName { name: String },

    /// Storage backend specific error
    #[error("Storage backend error for bucket {bucket}: {message}")]
    Backend { bucket: String, message: String },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl StorageError {
    pub(crate) fn from_object_store(bucket: &str, key: &str, err: object_store::Error) -> Self {
        match err {
            object_store::Error::NotFound { .. } => Self::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            },
            other => Self::Backend {
                bucket: bucket.to_string(),
                message: other.to_string(),
            },
        }
    }

    /// Whether the caller addressed something that does not exist or is not allowed
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. }
                | Self::UnknownBucket { .. }
                | Self::MissingBucket
                | Self::InvalidBucketName { .. }
        )
    }
}
