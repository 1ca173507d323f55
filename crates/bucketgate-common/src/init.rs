//! Global initialization utilities for the application

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

static ENV_FILE: OnceLock<Option<PathBuf>> = OnceLock::new();

/// Initialize the application environment
///
/// Loads variables from a `.env` file in the current directory (or any
/// parent) so `BUCKETGATE_*` settings can live next to the binary during
/// development. Returns the file that was loaded, if any.
///
/// Runs before logging is configured, so callers log the returned path
/// themselves once a subscriber is installed.
///
/// Safe to call multiple times - will only run once
pub fn initialize_environment() -> Option<&'static Path> {
    ENV_FILE.get_or_init(|| dotenvy::dotenv().ok()).as_deref()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initialize_environment_is_stable() {
        let first = initialize_environment();
        let second = initialize_environment();
        assert_eq!(first, second);
    }
}
