//! Configuration validation framework

use crate::{ConfigError, ConfigResult};
use regex::Regex;
use std::sync::OnceLock;

/// Get URL validation regex - returns None if regex compilation fails
fn get_url_regex() -> Option<&'static Regex> {
    static URL_REGEX: OnceLock<Option<Regex>> = OnceLock::new();
    URL_REGEX
        .get_or_init(|| Regex::new(r"^https?://[^\s/$.?#].[^\s]*$").ok())
        .as_ref()
}

fn get_bucket_regex() -> Option<&'static Regex> {
    static BUCKET_REGEX: OnceLock<Option<Regex>> = OnceLock::new();
    BUCKET_REGEX
        .get_or_init(|| Regex::new(r"^[a-z0-9][a-z0-9_-]{0,62}$").ok())
        .as_ref()
}

/// Trait for validating configuration values
pub trait Validate {
    /// Validate this configuration object
    ///
    /// # Errors
    /// Returns validation errors if the configuration is invalid
    fn validate(&self) -> ConfigResult<()>;
}

/// Validate a URL string
///
/// # Errors
/// Returns `ConfigError::InvalidUrl` if the URL format is invalid
pub fn validate_url(url: &str, field_name: &str) -> ConfigResult<()> {
    let valid = get_url_regex().map_or_else(
        // If regex compilation failed, do basic validation
        || url.starts_with("http://") || url.starts_with("https://"),
        |regex| regex.is_match(url),
    );

    if valid {
        Ok(())
    } else {
        Err(ConfigError::InvalidUrl {
            field: field_name.to_string(),
            url: url.to_string(),
        })
    }
}

/// Validate a port number
///
/// # Errors
/// Returns `ConfigError::InvalidPort` if port is 0
pub fn validate_port(port: u16, field_name: &str) -> ConfigResult<()> {
    if port == 0 {
        Err(ConfigError::InvalidPort {
            field: field_name.to_string(),
            port,
        })
    } else {
        Ok(())
    }
}

/// Validate a value is within a range
///
/// # Errors
/// Returns `ConfigError::OutOfRange` if value is outside the specified range
pub fn validate_range(value: u64, min: u64, max: u64, field_name: &str) -> ConfigResult<()> {
    if value < min || value > max {
        Err(ConfigError::OutOfRange {
            field: field_name.to_string(),
            value,
            min,
            max,
        })
    } else {
        Ok(())
    }
}

/// Validate a string is not empty
///
/// # Errors
/// Returns `ConfigError::MissingField` if the string is empty or whitespace-only
pub fn validate_non_empty(value: &str, field_name: &str) -> ConfigResult<()> {
    if value.trim().is_empty() {
        Err(ConfigError::MissingField {
            field: field_name.to_string(),
        })
    } else {
        Ok(())
    }
}

/// Whether `name` is an acceptable bucket name
///
/// Lowercase ASCII letters, digits, `-` and `_`, starting with a letter or
/// digit, at most 63 characters.
pub fn is_valid_bucket_name(name: &str) -> bool {
    get_bucket_regex().map_or_else(
        || {
            !name.is_empty()
                && name.len() <= 63
                && name
                    .bytes()
                    .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-' || b == b'_')
        },
        |regex| regex.is_match(name),
    )
}

/// Validate a bucket name
///
/// # Errors
/// Returns `ConfigError::InvalidBucketName` if the name is not acceptable
pub fn validate_bucket_name(name: &str) -> ConfigResult<()> {
    if is_valid_bucket_name(name) {
        Ok(())
    } else {
        Err(ConfigError::InvalidBucketName {
            name: name.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("https://pub-abc.r2.dev", "base_url").is_ok());
        assert!(validate_url("http://localhost:9000", "endpoint").is_ok());
        assert!(validate_url("ftp://example.com", "endpoint").is_err());
        assert!(validate_url("not a url", "endpoint").is_err());
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range(5, 1, 10, "x").is_ok());
        assert!(validate_range(0, 1, 10, "x").is_err());
        assert!(validate_range(11, 1, 10, "x").is_err());
    }

    #[test]
    fn test_bucket_names() {
        for ok in ["photos", "user-avatars", "docs_2024", "a"] {
            assert!(is_valid_bucket_name(ok), "{ok}");
        }
        let too_long = "a".repeat(64);
        for bad in ["", "Photos", "-photos", "../etc", "a/b", "UPLOAD_SECRET", too_long.as_str()] {
            assert!(!is_valid_bucket_name(bad), "{bad}");
        }
    }
}
