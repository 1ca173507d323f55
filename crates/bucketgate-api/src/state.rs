//! Application state for Axum handlers
//!
//! Built once at startup and cloned into every request. Everything shared is
//! behind an `Arc` and read-only, so handlers never take a lock.

use crate::{ApiError, ApiResult};
use axum::http::HeaderName;
use bucketgate_common::CorrelationId;
use bucketgate_config::ApplicationConfig;
use bucketgate_keys::{ObjectKey, PublicUrlBuilder, SanitizePolicy, sanitize};
use bucketgate_storage::BucketRegistry;
use std::fmt;
use std::sync::Arc;

const DEFAULT_AUTH_HEADER: &str = "x-auth-key";
const DEFAULT_SERVICE_NAME: &str = "bucketgate";

/// Application state shared by all handlers
#[derive(Clone)]
pub struct AppState {
    /// Allow-listed buckets
    pub registry: Arc<BucketRegistry>,
    /// Shared secret; `None` rejects every protected request
    pub upload_secret: Option<Arc<str>>,
    /// Header carrying the shared secret
    pub auth_header: HeaderName,
    /// Policy for file names
    pub file_policy: SanitizePolicy,
    /// Policy for folder prefixes; `None` when folders are disabled
    pub folder_policy: Option<SanitizePolicy>,
    /// Public URL construction, when a public base is known
    pub public_urls: Option<PublicUrlBuilder>,
    /// Service name reported by `/health`
    pub service_name: Arc<str>,
}

impl AppState {
    /// State with default key policies and no secret
    #[must_use]
    pub fn new(registry: BucketRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
            upload_secret: None,
            auth_header: HeaderName::from_static(DEFAULT_AUTH_HEADER),
            file_policy: SanitizePolicy::file_name(),
            folder_policy: Some(SanitizePolicy::folder()),
            public_urls: None,
            service_name: Arc::from(DEFAULT_SERVICE_NAME),
        }
    }

    /// State for a loaded configuration
    ///
    /// # Errors
    /// Returns an error if the configured auth header is not a valid header name
    pub fn from_config(
        config: &ApplicationConfig,
        registry: BucketRegistry,
    ) -> Result<Self, axum::http::header::InvalidHeaderName> {
        let keys = &config.keys;
        let file_policy = SanitizePolicy::file_name()
            .with_brackets(keys.allow_brackets)
            .with_max_length(keys.max_length);
        let folder_policy = keys.allow_folders.then(|| {
            SanitizePolicy::folder()
                .with_brackets(keys.allow_brackets)
                .with_max_length(keys.max_length)
        });

        let public_urls = config.public_base_url().map(|base| {
            PublicUrlBuilder::new(base).include_bucket(config.public_url.include_bucket)
        });

        Ok(Self {
            registry: Arc::new(registry),
            upload_secret: config.auth.upload_secret.as_deref().map(Arc::from),
            auth_header: HeaderName::try_from(config.auth.header_name.to_lowercase())?,
            file_policy,
            folder_policy,
            public_urls,
            service_name: Arc::from(config.telemetry.service_name.as_str()),
        })
    }

    #[must_use]
    pub fn with_secret(mut self, secret: &str) -> Self {
        self.upload_secret = Some(Arc::from(secret));
        self
    }

    #[must_use]
    pub fn with_public_urls(mut self, builder: PublicUrlBuilder) -> Self {
        self.public_urls = Some(builder);
        self
    }

    #[must_use]
    pub const fn with_folders(mut self, folder_policy: Option<SanitizePolicy>) -> Self {
        self.folder_policy = folder_policy;
        self
    }

    /// Sanitize a client-supplied file name and optional folder into a key
    ///
    /// Empty or absent folders mean the bucket root.
    ///
    /// # Errors
    /// Returns `ApiError::InvalidKey` if a name sanitizes to nothing and
    /// `ApiError::ValidationError` if a folder is given while folders are off
    pub fn object_key(
        &self,
        file_name: &str,
        folder: Option<&str>,
        correlation_id: CorrelationId,
    ) -> ApiResult<ObjectKey> {
        let file_name = sanitize(file_name, &self.file_policy)
            .map_err(|e| ApiError::from_key_error(&e, "fileName", correlation_id))?;

        let folder = match (folder.filter(|f| !f.is_empty()), &self.folder_policy) {
            (None, _) => None,
            (Some(folder), Some(policy)) => Some(
                sanitize(folder, policy)
                    .map_err(|e| ApiError::from_key_error(&e, "folder", correlation_id))?,
            ),
            (Some(_), None) => {
                return Err(ApiError::validation(
                    "Folders are disabled on this server",
                    Some("folder"),
                    correlation_id,
                ));
            }
        };

        Ok(ObjectKey::compose(folder.as_ref(), &file_name))
    }
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("registry", &self.registry)
            .field("upload_secret", &self.upload_secret.as_ref().map(|_| "<redacted>"))
            .field("auth_header", &self.auth_header)
            .field("file_policy", &self.file_policy)
            .field("folder_policy", &self.folder_policy)
            .field("public_urls", &self.public_urls)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn state() -> AppState {
        AppState::new(BucketRegistry::new())
    }

    #[test]
    fn test_object_key_sanitizes_both_parts() {
        let key = state()
            .object_key("my photo (1).JPG", Some("albums/summer trip"), CorrelationId::new())
            .unwrap();
        assert_eq!(key.as_str(), "albums/summer_trip/my_photo_(1).JPG");
    }

    #[test]
    fn test_object_key_traversal_stays_inside_bucket() {
        let key = state()
            .object_key("../../etc/passwd", Some("../.."), CorrelationId::new())
            .unwrap();
        assert!(!key.as_str().contains(".."));
        assert_eq!(key.file_name().as_str(), "____etc_passwd");
    }

    #[test]
    fn test_empty_folder_is_bucket_root() {
        let key = state()
            .object_key("a.txt", Some(""), CorrelationId::new())
            .unwrap();
        assert_eq!(key.as_str(), "a.txt");
    }

    #[test]
    fn test_empty_file_name_is_rejected() {
        let error = state()
            .object_key("", None, CorrelationId::new())
            .unwrap_err();
        assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(error.code(), "INVALID_KEY");
    }

    #[test]
    fn test_folder_rejected_when_disabled() {
        let state = state().with_folders(None);
        let error = state
            .object_key("a.txt", Some("albums"), CorrelationId::new())
            .unwrap_err();
        assert_eq!(error.code(), "VALIDATION_ERROR");

        assert!(state.object_key("a.txt", None, CorrelationId::new()).is_ok());
    }

    #[test]
    fn test_from_config_applies_key_settings() {
        let mut config = ApplicationConfig::default();
        config.keys.max_length = 5;
        config.keys.allow_brackets = false;
        config.auth.upload_secret = Some("s3cret".to_string());
        config.storage.s3.account_id = Some("acct".to_string());

        let state = AppState::from_config(&config, BucketRegistry::new()).unwrap();

        let key = state.object_key("(abc).png", None, CorrelationId::new()).unwrap();
        assert_eq!(key.as_str(), "_abc_");
        assert_eq!(state.upload_secret.as_deref(), Some("s3cret"));
        assert_eq!(state.auth_header.as_str(), "x-auth-key");
        assert_eq!(
            state.public_urls.as_ref().map(PublicUrlBuilder::base),
            Some("https://pub-acct.r2.dev")
        );
        assert!(!format!("{state:?}").contains("s3cret"));
    }
}
