//! Error types for key sanitization

use thiserror::Error;

/// Result type alias for key operations
pub type KeyResult<T> = Result<T, KeyError>;

/// Errors produced while turning a client-supplied name into a storage key
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    /// Sanitization left nothing to store under.
    ///
    /// Callers substitute a fallback name for empty input before sanitizing,
    /// so this only surfaces for an empty candidate that slipped past that
    /// step or a policy whose `max_length` is zero.
    #[error(
        "Sanitized key is empty (candidate had {candidate_chars} characters, max length {max_length})"
    )]
    InvalidKey {
        candidate_chars: usize,
        max_length: usize,
    },
}
