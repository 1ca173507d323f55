//! Error sanitization utilities for security
//!
//! Storage backends put bucket names, endpoints and sometimes credentials
//! into their error strings. These helpers log the detail internally and
//! hand back a message that is safe to return to a client.

use crate::CorrelationId;
use tracing::error;

/// Sanitize an error message for external consumption
///
/// Logs the detailed error against the request's correlation ID and returns
/// a generic message referencing it
pub fn sanitize_error<E: std::fmt::Display>(
    error: E,
    context: &str,
    correlation_id: &CorrelationId,
) -> String {
    sanitize_with_message(error, context, "Operation failed", correlation_id)
}

/// Sanitize an error with a user-friendly message
pub fn sanitize_with_message<E: std::fmt::Display>(
    error: E,
    context: &str,
    user_message: &str,
    correlation_id: &CorrelationId,
) -> String {
    error!(
        correlation_id = %correlation_id,
        error = %error,
        context = %context,
        "Internal error occurred"
    );

    format!("{user_message} (ref: {correlation_id})")
}
