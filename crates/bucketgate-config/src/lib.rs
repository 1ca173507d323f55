//! Centralized configuration management for bucketgate
//!
//! Configuration follows a simple hierarchy:
//! 1. Safe defaults (defined as constants)
//! 2. Environment variable overrides (`BUCKETGATE_*`, with the legacy
//!    worker names `UPLOAD_SECRET`, `ALLOWED_ORIGIN` and `ACCOUNT_ID`
//!    accepted as fallbacks)
//! 3. Runtime validation
//!
//! A TOML file can replace the environment entirely via
//! [`source::TomlFileSource`]; missing sections fall back to the defaults.

pub mod error;
pub mod source;
pub mod validation;

pub use error::{ConfigError, ConfigResult};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validation::Validate;

// =============================================================================
// SAFE DEFAULTS
// =============================================================================

// Server
const DEFAULT_API_HOST: &str = "127.0.0.1"; // Localhost only for security
const DEFAULT_API_PORT: u16 = 8080;
const DEFAULT_API_TIMEOUT_SECONDS: u64 = 60;
const DEFAULT_MAX_BODY_BYTES: u64 = 100 * 1024 * 1024; // 100 MiB
const MAX_BODY_BYTES_LIMIT: u64 = 5 * 1024 * 1024 * 1024; // 5 GiB
const DEFAULT_ALLOWED_ORIGIN: &str = "*";
const DEFAULT_CORS_MAX_AGE_SECONDS: u64 = 86_400;

// Auth
const DEFAULT_AUTH_HEADER: &str = "X-Auth-Key";

// Storage
const DEFAULT_BUCKET: &str = "uploads";
const DEFAULT_LOCAL_ROOT: &str = "./data";
const DEFAULT_S3_REGION: &str = "auto"; // What R2 expects

// Keys
const DEFAULT_MAX_KEY_LENGTH: usize = 200;
const DEFAULT_ALLOW_BRACKETS: bool = true;
const DEFAULT_ALLOW_FOLDERS: bool = true;

// Telemetry
const DEFAULT_TRACING_LEVEL: &str = "info";
const DEFAULT_JSON_LOGS: bool = false;
const DEFAULT_SERVICE_NAME: &str = "bucketgate";

/// First non-empty value among the given environment variables
fn env_var(names: &[&str]) -> Option<String> {
    names
        .iter()
        .find_map(|name| std::env::var(name).ok())
        .filter(|value| !value.trim().is_empty())
}

fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    env_var(&[name]).and_then(|s| s.trim().parse().ok())
}

/// Core configuration for the entire bucketgate service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationConfig {
    /// HTTP server configuration
    pub server: ServerConfig,

    /// Shared-secret authentication
    pub auth: AuthConfig,

    /// Storage backend and bucket allow-list
    pub storage: StorageConfig,

    /// Key sanitization policy
    pub keys: KeysConfig,

    /// Public URL construction
    pub public_url: PublicUrlConfig,

    /// Logging configuration
    pub telemetry: TelemetryConfig,
}

// =============================================================================
// SERVER
// =============================================================================

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind host
    pub host: String,

    /// Bind port
    pub port: u16,

    /// Request timeout in seconds
    pub timeout_seconds: u64,

    /// Largest accepted request body in bytes
    pub max_body_bytes: u64,

    /// Value for `Access-Control-Allow-Origin` (`*` or an origin URL)
    pub allowed_origin: String,

    /// Preflight cache lifetime in seconds
    pub cors_max_age_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_API_HOST.to_string(),
            port: DEFAULT_API_PORT,
            timeout_seconds: DEFAULT_API_TIMEOUT_SECONDS,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            allowed_origin: DEFAULT_ALLOWED_ORIGIN.to_string(),
            cors_max_age_seconds: DEFAULT_CORS_MAX_AGE_SECONDS,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables with safe defaults
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Replace fields whose environment variable is set
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        Self {
            host: env_var(&["BUCKETGATE_API_HOST"]).unwrap_or(self.host),
            port: env_parse("BUCKETGATE_API_PORT")
                .or_else(|| env_parse("PORT"))
                .unwrap_or(self.port),
            timeout_seconds: env_parse("BUCKETGATE_API_TIMEOUT_SECONDS")
                .unwrap_or(self.timeout_seconds),
            max_body_bytes: env_parse("BUCKETGATE_API_MAX_BODY_BYTES")
                .unwrap_or(self.max_body_bytes),
            allowed_origin: env_var(&["BUCKETGATE_ALLOWED_ORIGIN", "ALLOWED_ORIGIN"])
                .unwrap_or(self.allowed_origin),
            cors_max_age_seconds: env_parse("BUCKETGATE_CORS_MAX_AGE_SECONDS")
                .unwrap_or(self.cors_max_age_seconds),
        }
    }

    /// Whether any origin may call the API
    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origin.trim() == "*"
    }

    /// `host:port` for binding
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Validate for ServerConfig {
    fn validate(&self) -> ConfigResult<()> {
        validation::validate_non_empty(&self.host, "server.host")?;
        validation::validate_port(self.port, "server.port")?;
        validation::validate_range(self.timeout_seconds, 1, 3600, "server.timeout_seconds")?;
        validation::validate_range(
            self.max_body_bytes,
            1,
            MAX_BODY_BYTES_LIMIT,
            "server.max_body_bytes",
        )?;
        validation::validate_range(
            self.cors_max_age_seconds,
            0,
            7 * 86_400,
            "server.cors_max_age_seconds",
        )?;
        validation::validate_non_empty(&self.allowed_origin, "server.allowed_origin")?;
        if !self.allows_any_origin() {
            validation::validate_url(&self.allowed_origin, "server.allowed_origin")?;
        }
        Ok(())
    }
}

// =============================================================================
// AUTH
// =============================================================================

/// Shared-secret authentication
///
/// With no secret configured every protected request is rejected.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Secret clients send in `header_name`
    #[serde(skip_serializing)]
    pub upload_secret: Option<String>,

    /// Header carrying the secret
    pub header_name: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            upload_secret: None,
            header_name: DEFAULT_AUTH_HEADER.to_string(),
        }
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field(
                "upload_secret",
                &self.upload_secret.as_ref().map(|_| "<redacted>"),
            )
            .field("header_name", &self.header_name)
            .finish()
    }
}

impl AuthConfig {
    /// Load configuration from environment variables with safe defaults
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Replace fields whose environment variable is set
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        Self {
            upload_secret: env_var(&["BUCKETGATE_UPLOAD_SECRET", "UPLOAD_SECRET"])
                .or(self.upload_secret),
            header_name: env_var(&["BUCKETGATE_AUTH_HEADER"]).unwrap_or(self.header_name),
        }
    }

    /// Whether protected routes can ever succeed
    pub const fn is_configured(&self) -> bool {
        self.upload_secret.is_some()
    }
}

impl Validate for AuthConfig {
    fn validate(&self) -> ConfigResult<()> {
        validation::validate_non_empty(&self.header_name, "auth.header_name")?;
        if let Some(secret) = &self.upload_secret {
            validation::validate_non_empty(secret, "auth.upload_secret")?;
        }
        Ok(())
    }
}

// =============================================================================
// STORAGE
// =============================================================================

/// Which object-storage implementation backs the buckets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process memory; contents vanish on restart
    #[default]
    Memory,
    /// One directory per bucket under `local_root`
    Local,
    /// S3-compatible service (AWS S3, Cloudflare R2, MinIO)
    S3,
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Memory => "memory",
            Self::Local => "local",
            Self::S3 => "s3",
        };
        write!(f, "{name}")
    }
}

impl FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "memory" | "mem" => Ok(Self::Memory),
            "local" | "fs" | "filesystem" => Ok(Self::Local),
            "s3" | "r2" => Ok(Self::S3),
            other => Err(ConfigError::Generic {
                message: format!("Unknown storage backend: {other}"),
            }),
        }
    }
}

/// S3-compatible connection settings
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct S3Config {
    /// Endpoint URL; derived from `account_id` for R2 when absent
    pub endpoint: Option<String>,

    /// Region (R2 uses "auto")
    pub region: String,

    /// Cloudflare account ID
    pub account_id: Option<String>,

    pub access_key_id: Option<String>,

    #[serde(skip_serializing)]
    pub secret_access_key: Option<String>,

    /// Permit plain-HTTP endpoints (local MinIO)
    pub allow_http: bool,
}

impl fmt::Debug for S3Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3Config")
            .field("endpoint", &self.endpoint)
            .field("region", &self.region)
            .field("account_id", &self.account_id)
            .field("access_key_id", &self.access_key_id)
            .field(
                "secret_access_key",
                &self.secret_access_key.as_ref().map(|_| "<redacted>"),
            )
            .field("allow_http", &self.allow_http)
            .finish()
    }
}

impl S3Config {
    /// Replace fields whose environment variable is set
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        Self {
            endpoint: env_var(&["BUCKETGATE_S3_ENDPOINT"]).or(self.endpoint),
            region: env_var(&["BUCKETGATE_S3_REGION"]).unwrap_or(self.region),
            account_id: env_var(&["BUCKETGATE_S3_ACCOUNT_ID", "ACCOUNT_ID"]).or(self.account_id),
            access_key_id: env_var(&["BUCKETGATE_S3_ACCESS_KEY_ID"]).or(self.access_key_id),
            secret_access_key: env_var(&["BUCKETGATE_S3_SECRET_ACCESS_KEY"])
                .or(self.secret_access_key),
            allow_http: env_parse("BUCKETGATE_S3_ALLOW_HTTP").unwrap_or(self.allow_http),
        }
    }

    /// Endpoint to connect to: explicit, else the R2 endpoint for the account
    pub fn resolved_endpoint(&self) -> Option<String> {
        self.endpoint.clone().or_else(|| {
            self.account_id
                .as_ref()
                .map(|account| format!("https://{account}.r2.cloudflarestorage.com"))
        })
    }
}

impl Validate for S3Config {
    fn validate(&self) -> ConfigResult<()> {
        validation::validate_non_empty(&self.region, "storage.s3.region")?;
        match self.resolved_endpoint() {
            Some(endpoint) => validation::validate_url(&endpoint, "storage.s3.endpoint")?,
            None => {
                return Err(ConfigError::MissingField {
                    field: "storage.s3.endpoint (or storage.s3.account_id)".to_string(),
                });
            }
        }
        if self.access_key_id.is_some() != self.secret_access_key.is_some() {
            return Err(ConfigError::Generic {
                message: "storage.s3.access_key_id and storage.s3.secret_access_key must be set together"
                    .to_string(),
            });
        }
        Ok(())
    }
}

/// Storage backend and the bucket allow-list
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,

    /// Every bucket clients may address; anything else is rejected
    pub buckets: Vec<String>,

    /// Bucket used when a request names none
    #[serde(default)]
    pub default_bucket: Option<String>,

    /// Root directory for the local backend
    pub local_root: String,

    pub s3: S3Config,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            buckets: vec![DEFAULT_BUCKET.to_string()],
            default_bucket: Some(DEFAULT_BUCKET.to_string()),
            local_root: DEFAULT_LOCAL_ROOT.to_string(),
            s3: S3Config {
                region: DEFAULT_S3_REGION.to_string(),
                ..S3Config::default()
            },
        }
    }
}

impl StorageConfig {
    /// Load configuration from environment variables with safe defaults
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Replace fields whose environment variable is set
    ///
    /// `BUCKETGATE_BUCKETS` is a comma-separated list. When it replaces the
    /// list and no `BUCKETGATE_DEFAULT_BUCKET` is given, the previous default
    /// survives only if it is still listed.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        let backend = env_var(&["BUCKETGATE_STORAGE_BACKEND"])
            .and_then(|s| {
                s.parse()
                    .map_err(|e| tracing::warn!("{e}, using {}", self.backend))
                    .ok()
            })
            .unwrap_or(self.backend);

        let buckets: Vec<String> = env_var(&["BUCKETGATE_BUCKETS"]).map_or(self.buckets, |list| {
            list.split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect()
        });

        let default_bucket = env_var(&["BUCKETGATE_DEFAULT_BUCKET"])
            .or_else(|| self.default_bucket.filter(|previous| buckets.contains(previous)));

        Self {
            backend,
            buckets,
            default_bucket,
            local_root: env_var(&["BUCKETGATE_STORAGE_LOCAL_ROOT"]).unwrap_or(self.local_root),
            s3: self.s3.with_env_overrides(),
        }
    }
}

impl Validate for StorageConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.buckets.is_empty() {
            return Err(ConfigError::MissingField {
                field: "storage.buckets".to_string(),
            });
        }
        for bucket in &self.buckets {
            validation::validate_bucket_name(bucket)?;
        }
        if let Some(default_bucket) = &self.default_bucket
            && !self.buckets.contains(default_bucket)
        {
            return Err(ConfigError::Generic {
                message: format!(
                    "storage.default_bucket '{default_bucket}' is not listed in storage.buckets"
                ),
            });
        }
        match self.backend {
            StorageBackend::Memory => Ok(()),
            StorageBackend::Local => {
                validation::validate_non_empty(&self.local_root, "storage.local_root")
            }
            StorageBackend::S3 => self.s3.validate(),
        }
    }
}

// =============================================================================
// KEYS
// =============================================================================

/// Key sanitization policy applied to every client-supplied name
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeysConfig {
    /// Maximum characters kept for a file name or folder
    pub max_length: usize,

    /// Keep `(`, `)`, `[` and `]` in names
    pub allow_brackets: bool,

    /// Honor the `folder` request field
    pub allow_folders: bool,
}

impl Default for KeysConfig {
    fn default() -> Self {
        Self {
            max_length: DEFAULT_MAX_KEY_LENGTH,
            allow_brackets: DEFAULT_ALLOW_BRACKETS,
            allow_folders: DEFAULT_ALLOW_FOLDERS,
        }
    }
}

impl KeysConfig {
    /// Load configuration from environment variables with safe defaults
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Replace fields whose environment variable is set
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        Self {
            max_length: env_parse("BUCKETGATE_KEYS_MAX_LENGTH").unwrap_or(self.max_length),
            allow_brackets: env_parse("BUCKETGATE_KEYS_ALLOW_BRACKETS")
                .unwrap_or(self.allow_brackets),
            allow_folders: env_parse("BUCKETGATE_KEYS_ALLOW_FOLDERS")
                .unwrap_or(self.allow_folders),
        }
    }
}

impl Validate for KeysConfig {
    fn validate(&self) -> ConfigResult<()> {
        validation::validate_range(self.max_length as u64, 1, 1024, "keys.max_length")
    }
}

// =============================================================================
// PUBLIC URL
// =============================================================================

/// Public URL construction for upload responses
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PublicUrlConfig {
    /// Base origin, e.g. `https://cdn.example.com`
    ///
    /// When absent and an R2 account ID is configured, the account's
    /// `https://pub-<account>.r2.dev` URL is used.
    pub base_url: Option<String>,

    /// Put the bucket name before the key
    pub include_bucket: bool,
}

impl PublicUrlConfig {
    /// Replace fields whose environment variable is set
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        Self {
            base_url: env_var(&["BUCKETGATE_PUBLIC_BASE_URL"]).or(self.base_url),
            include_bucket: env_parse("BUCKETGATE_PUBLIC_INCLUDE_BUCKET")
                .unwrap_or(self.include_bucket),
        }
    }
}

impl Validate for PublicUrlConfig {
    fn validate(&self) -> ConfigResult<()> {
        if let Some(base_url) = &self.base_url {
            validation::validate_url(base_url, "public_url.base_url")?;
        }
        Ok(())
    }
}

// =============================================================================
// TELEMETRY
// =============================================================================

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Default tracing level when `RUST_LOG` is unset
    pub tracing_level: String,

    /// Emit JSON log lines
    pub json_logs: bool,

    /// Service name reported by `/health`
    pub service_name: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            tracing_level: DEFAULT_TRACING_LEVEL.to_string(),
            json_logs: DEFAULT_JSON_LOGS,
            service_name: DEFAULT_SERVICE_NAME.to_string(),
        }
    }
}

impl TelemetryConfig {
    /// Load configuration from environment variables with safe defaults
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Replace fields whose environment variable is set
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        Self {
            tracing_level: env_var(&["BUCKETGATE_TELEMETRY_TRACING_LEVEL"])
                .unwrap_or(self.tracing_level),
            json_logs: env_parse("BUCKETGATE_TELEMETRY_JSON_LOGS").unwrap_or(self.json_logs),
            service_name: env_var(&["BUCKETGATE_TELEMETRY_SERVICE_NAME"])
                .unwrap_or(self.service_name),
        }
    }
}

impl Validate for TelemetryConfig {
    fn validate(&self) -> ConfigResult<()> {
        validation::validate_non_empty(&self.service_name, "telemetry.service_name")?;

        match self.tracing_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
            _ => Err(ConfigError::Generic {
                message: format!("Invalid tracing level: {}", self.tracing_level),
            }),
        }
    }
}

// =============================================================================
// APPLICATION
// =============================================================================

impl ApplicationConfig {
    /// Load configuration from environment variables with safe defaults
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Replace every field whose environment variable is set
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        Self {
            server: self.server.with_env_overrides(),
            auth: self.auth.with_env_overrides(),
            storage: self.storage.with_env_overrides(),
            keys: self.keys.with_env_overrides(),
            public_url: self.public_url.with_env_overrides(),
            telemetry: self.telemetry.with_env_overrides(),
        }
    }

    /// Public base URL: explicit setting, else the R2 dev URL for the account
    pub fn public_base_url(&self) -> Option<String> {
        self.public_url.base_url.clone().or_else(|| {
            self.storage
                .s3
                .account_id
                .as_ref()
                .map(|account| format!("https://pub-{account}.r2.dev"))
        })
    }
}

impl Validate for ApplicationConfig {
    fn validate(&self) -> ConfigResult<()> {
        self.server.validate()?;
        self.auth.validate()?;
        self.storage.validate()?;
        self.keys.validate()?;
        self.public_url.validate()?;
        self.telemetry.validate()?;
        Ok(())
    }
}
