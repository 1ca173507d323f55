//! Common utilities shared across bucketgate crates
//!
//! Correlation IDs, environment initialization and error-message sanitizing
//! live here so the API, storage and config crates agree on them.

pub mod correlation;
pub mod error_sanitizer;
pub mod init;

pub use correlation::{CORRELATION_ID_HEADER, CorrelationId};
pub use init::initialize_environment;
