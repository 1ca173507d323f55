//! Structured API error handling for the bucketgate API.
//!
//! Every variant carries the request's correlation ID. The response body is
//! `{success: false, error, code, field?, correlationId}` and the ID is echoed in the
//! `X-Correlation-ID` header. Backend failures are logged in full and reach
//! the client only as a sanitized message.
//!
//! # Usage
//!
//! ```rust
//! use bucketgate_api::{ApiError, ApiResult};
//! use bucketgate_common::CorrelationId;
//!
//! fn require_file(present: bool) -> ApiResult<()> {
//!     if present {
//!         Ok(())
//!     } else {
//!         Err(ApiError::validation("Invalid file", Some("file"), CorrelationId::new()))
//!     }
//! }
//! ```

use axum::{
    Json,
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use bucketgate_common::{CORRELATION_ID_HEADER, CorrelationId, error_sanitizer};
use bucketgate_keys::KeyError;
use bucketgate_storage::StorageError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};

/// Structured API error types with correlation IDs for request tracking.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or wrong shared secret, or no secret configured at all.
    #[error("Unauthorized (correlation: {correlation_id})")]
    Unauthorized { correlation_id: CorrelationId },

    /// Request failed validation.
    ///
    /// Malformed multipart or JSON bodies, missing required fields.
    #[error("{message} (correlation: {correlation_id})")]
    ValidationError {
        message: String,
        field: Option<String>,
        correlation_id: CorrelationId,
    },

    /// A name sanitized down to nothing.
    #[error("Invalid {field}: nothing left after sanitizing (correlation: {correlation_id})")]
    InvalidKey {
        field: String,
        correlation_id: CorrelationId,
    },

    /// The request named a bucket that is not in the allow-list.
    #[error("Bucket '{bucket}' not found (correlation: {correlation_id})")]
    UnknownBucket {
        bucket: String,
        correlation_id: CorrelationId,
    },

    /// No bucket named and no default configured.
    #[error("bucketName is required (correlation: {correlation_id})")]
    MissingBucket { correlation_id: CorrelationId },

    /// The addressed object does not exist.
    #[error("File '{key}' not found (correlation: {correlation_id})")]
    ObjectNotFound {
        key: String,
        correlation_id: CorrelationId,
    },

    /// No route for this method and path.
    #[error("Not Found. Use POST /upload, /delete or /download (correlation: {correlation_id})")]
    RouteNotFound { correlation_id: CorrelationId },

    /// Request body over the configured limit.
    #[error("Request body too large (correlation: {correlation_id})")]
    PayloadTooLarge { correlation_id: CorrelationId },

    /// The request ran past the configured timeout.
    #[error("Request timed out after {timeout_seconds}s (correlation: {correlation_id})")]
    RequestTimeout {
        timeout_seconds: u64,
        correlation_id: CorrelationId,
    },

    /// The storage backend failed; `message` is already sanitized.
    #[error("{message}")]
    StorageUnavailable {
        message: String,
        correlation_id: CorrelationId,
    },

    /// Internal server error with correlation ID.
    #[error("Internal server error (correlation: {correlation_id})")]
    InternalServerError { correlation_id: CorrelationId },
}

/// Error response sent to API clients.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorResponse {
    /// Always false
    pub success: bool,
    /// Human-readable error message
    pub error: String,
    /// Stable machine-readable code
    pub code: String,
    /// Request field the error refers to, when there is one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Correlation ID for tracking and support
    pub correlation_id: CorrelationId,
}

impl ApiError {
    /// Get the correlation ID from any error variant.
    pub const fn correlation_id(&self) -> &CorrelationId {
        match self {
            Self::Unauthorized { correlation_id }
            | Self::ValidationError { correlation_id, .. }
            | Self::InvalidKey { correlation_id, .. }
            | Self::UnknownBucket { correlation_id, .. }
            | Self::MissingBucket { correlation_id }
            | Self::ObjectNotFound { correlation_id, .. }
            | Self::RouteNotFound { correlation_id }
            | Self::PayloadTooLarge { correlation_id }
            | Self::RequestTimeout { correlation_id, .. }
            | Self::StorageUnavailable { correlation_id, .. }
            | Self::InternalServerError { correlation_id } => correlation_id,
        }
    }

    /// Get the HTTP status code for this error.
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::ValidationError { .. }
            | Self::InvalidKey { .. }
            | Self::UnknownBucket { .. }
            | Self::MissingBucket { .. } => StatusCode::BAD_REQUEST,
            Self::ObjectNotFound { .. } | Self::RouteNotFound { .. } => StatusCode::NOT_FOUND,
            Self::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::RequestTimeout { .. } => StatusCode::REQUEST_TIMEOUT,
            Self::StorageUnavailable { .. } => StatusCode::BAD_GATEWAY,
            Self::InternalServerError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable code clients can match on.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Unauthorized { .. } => "UNAUTHORIZED",
            Self::ValidationError { .. } => "VALIDATION_ERROR",
            Self::InvalidKey { .. } => "INVALID_KEY",
            Self::UnknownBucket { .. } => "UNKNOWN_BUCKET",
            Self::MissingBucket { .. } => "MISSING_BUCKET",
            Self::ObjectNotFound { .. } => "OBJECT_NOT_FOUND",
            Self::RouteNotFound { .. } => "NOT_FOUND",
            Self::PayloadTooLarge { .. } => "PAYLOAD_TOO_LARGE",
            Self::RequestTimeout { .. } => "REQUEST_TIMEOUT",
            Self::StorageUnavailable { .. } => "STORAGE_ERROR",
            Self::InternalServerError { .. } => "INTERNAL_ERROR",
        }
    }

    /// Request field a validation failure refers to.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::ValidationError { field, .. } => field.as_deref(),
            Self::InvalidKey { field, .. } => Some(field.as_str()),
            _ => None,
        }
    }

    /// Message for the `error` field, without the correlation suffix.
    pub fn user_message(&self) -> String {
        match self {
            Self::Unauthorized { .. } => "Unauthorized".to_string(),
            Self::ValidationError { message, .. } | Self::StorageUnavailable { message, .. } => {
                message.clone()
            }
            Self::InvalidKey { field, .. } => {
                format!("Invalid {field}: nothing left after sanitizing")
            }
            Self::UnknownBucket { bucket, .. } => format!("Bucket '{bucket}' not found"),
            Self::MissingBucket { .. } => "bucketName is required".to_string(),
            Self::ObjectNotFound { key, .. } => format!("File '{key}' not found"),
            Self::RouteNotFound { .. } => {
                "Not Found. Use POST /upload, /delete or /download".to_string()
            }
            Self::PayloadTooLarge { .. } => "Request body too large".to_string(),
            Self::RequestTimeout { timeout_seconds, .. } => {
                format!("Request timed out after {timeout_seconds}s")
            }
            Self::InternalServerError { .. } => "Internal server error".to_string(),
        }
    }

    /// Create a validation error.
    pub fn validation(
        message: impl Into<String>,
        field: Option<&str>,
        correlation_id: CorrelationId,
    ) -> Self {
        Self::ValidationError {
            message: message.into(),
            field: field.map(str::to_string),
            correlation_id,
        }
    }

    /// Map a sanitizer failure on `field`.
    pub fn from_key_error(error: &KeyError, field: &str, correlation_id: CorrelationId) -> Self {
        match error {
            KeyError::InvalidKey { .. } => Self::InvalidKey {
                field: field.to_string(),
                correlation_id,
            },
        }
    }

    /// Map a storage failure, sanitizing backend detail.
    pub fn from_storage(error: StorageError, correlation_id: CorrelationId) -> Self {
        match error {
            StorageError::NotFound { key, .. } => Self::ObjectNotFound {
                key,
                correlation_id,
            },
            StorageError::UnknownBucket { name } | StorageError::InvalidBucketName { name } => {
                Self::UnknownBucket {
                    bucket: name,
                    correlation_id,
                }
            }
            StorageError::MissingBucket => Self::MissingBucket { correlation_id },
            other @ StorageError::Backend { .. } => Self::StorageUnavailable {
                message: error_sanitizer::sanitize_with_message(
                    &other,
                    "storage_backend",
                    "Storage backend error",
                    &correlation_id,
                ),
                correlation_id,
            },
            other @ StorageError::Configuration(_) => {
                error_sanitizer::sanitize_error(&other, "storage_configuration", &correlation_id);
                Self::InternalServerError { correlation_id }
            }
        }
    }
}

/// Axum HTTP response implementation for `ApiError`.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let correlation_id = *self.correlation_id();

        if status.is_server_error() {
            error!(
                correlation_id = %correlation_id,
                error = %self,
                code = self.code(),
                "Server error"
            );
        } else {
            warn!(
                correlation_id = %correlation_id,
                error = %self,
                code = self.code(),
                "Client error"
            );
        }

        let error_response = ApiErrorResponse {
            success: false,
            error: self.user_message(),
            code: self.code().to_string(),
            field: self.field().map(str::to_string),
            correlation_id,
        };

        let mut response = (status, Json(error_response)).into_response();

        if let Ok(header_value) = HeaderValue::from_str(&correlation_id.to_string()) {
            response
                .headers_mut()
                .insert(CORRELATION_ID_HEADER, header_value);
        }

        response
    }
}

/// Result type for API operations.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    async fn body_json(response: Response) -> Result<serde_json::Value, Box<dyn std::error::Error>> {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    #[tokio::test]
    async fn test_error_body_shape() -> TestResult {
        let id = CorrelationId::new();
        let response = ApiError::Unauthorized { correlation_id: id }.into_response();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(CORRELATION_ID_HEADER).map(HeaderValue::as_bytes),
            Some(id.to_string().as_bytes())
        );

        let json = body_json(response).await?;
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "Unauthorized");
        assert_eq!(json["code"], "UNAUTHORIZED");
        assert_eq!(json["correlationId"], id.to_string());
        assert!(json.get("field").is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_validation_error_names_field() -> TestResult {
        let error = ApiError::validation("Invalid file", Some("file"), CorrelationId::new());
        assert_eq!(error.field(), Some("file"));

        let json = body_json(error.into_response()).await?;
        assert_eq!(json["code"], "VALIDATION_ERROR");
        assert_eq!(json["field"], "file");

        let error = ApiError::from_key_error(
            &KeyError::InvalidKey {
                candidate_chars: 0,
                max_length: 200,
            },
            "folder",
            CorrelationId::new(),
        );
        let json = body_json(error.into_response()).await?;
        assert_eq!(json["field"], "folder");
        Ok(())
    }

    #[tokio::test]
    async fn test_backend_errors_are_sanitized() -> TestResult {
        let id = CorrelationId::new();
        let error = ApiError::from_storage(
            StorageError::Backend {
                bucket: "photos".to_string(),
                message: "PUT https://acct.r2.cloudflarestorage.com denied".to_string(),
            },
            id,
        );
        assert_eq!(error.status_code(), StatusCode::BAD_GATEWAY);

        let json = body_json(error.into_response()).await?;
        let message = json["error"].as_str().unwrap_or_default();
        assert!(message.starts_with("Storage backend error (ref: "));
        assert!(!message.contains("cloudflarestorage"));
        Ok(())
    }

    #[test]
    fn test_storage_error_mapping() {
        let id = CorrelationId::new();
        let cases = [
            (
                StorageError::NotFound {
                    bucket: "photos".to_string(),
                    key: "a.png".to_string(),
                },
                StatusCode::NOT_FOUND,
            ),
            (
                StorageError::UnknownBucket {
                    name: "secrets".to_string(),
                },
                StatusCode::BAD_REQUEST,
            ),
            (StorageError::MissingBucket, StatusCode::BAD_REQUEST),
            (
                StorageError::Configuration("bad endpoint".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (storage_error, expected) in cases {
            assert_eq!(ApiError::from_storage(storage_error, id).status_code(), expected);
        }
    }

    #[test]
    fn test_key_error_maps_to_bad_request() {
        let error = ApiError::from_key_error(
            &KeyError::InvalidKey {
                candidate_chars: 0,
                max_length: 200,
            },
            "fileName",
            CorrelationId::new(),
        );
        assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(error.code(), "INVALID_KEY");
    }
}
