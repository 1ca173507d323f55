//! Request middleware: correlation IDs, request timeouts and shared-secret
//! authentication

use crate::{ApiError, AppState};
use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use bucketgate_common::{CORRELATION_ID_HEADER, CorrelationId};
use std::time::Duration;
use subtle::ConstantTimeEq;

/// Per-request context stored in request extensions
#[derive(Debug, Clone, Copy)]
pub struct RequestContext {
    pub correlation_id: CorrelationId,
}

impl RequestContext {
    /// Correlation ID from an optional extension, minting one if absent
    pub fn correlation_id_or_new(context: Option<&Self>) -> CorrelationId {
        context.map_or_else(CorrelationId::new, |ctx| ctx.correlation_id)
    }
}

/// Honor an incoming `X-Correlation-ID` (when it is a UUID), otherwise mint
/// one; expose it to handlers and echo it on the response
pub async fn correlation_id_middleware(mut request: Request, next: Next) -> Response {
    let correlation_id = request
        .headers()
        .get(CORRELATION_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(CorrelationId::parse)
        .unwrap_or_default();

    request
        .extensions_mut()
        .insert(RequestContext { correlation_id });

    let mut response = next.run(request).await;

    if !response.headers().contains_key(CORRELATION_ID_HEADER)
        && let Ok(value) = HeaderValue::from_str(&correlation_id.to_string())
    {
        response.headers_mut().insert(CORRELATION_ID_HEADER, value);
    }

    response
}

/// Abort a request that runs longer than `limit`, body reading included
pub async fn request_timeout(State(limit): State<Duration>, request: Request, next: Next) -> Response {
    let correlation_id =
        RequestContext::correlation_id_or_new(request.extensions().get::<RequestContext>());
    let path = request.uri().path().to_string();

    if let Ok(response) = tokio::time::timeout(limit, next.run(request)).await {
        response
    } else {
        tracing::warn!(
            correlation_id = %correlation_id,
            path = %path,
            timeout_seconds = limit.as_secs(),
            "Request timed out"
        );
        ApiError::RequestTimeout {
            timeout_seconds: limit.as_secs(),
            correlation_id,
        }
        .into_response()
    }
}

/// Reject requests whose auth header does not match the configured secret
///
/// With no secret configured every request is rejected.
pub async fn require_auth(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let correlation_id =
        RequestContext::correlation_id_or_new(request.extensions().get::<RequestContext>());

    let authorized = state
        .upload_secret
        .as_deref()
        .is_some_and(|secret| header_matches(request.headers(), &state, secret));

    if authorized {
        next.run(request).await
    } else {
        tracing::warn!(
            correlation_id = %correlation_id,
            path = %request.uri().path(),
            secret_configured = state.upload_secret.is_some(),
            "Rejected unauthenticated request"
        );
        ApiError::Unauthorized { correlation_id }.into_response()
    }
}

fn header_matches(headers: &HeaderMap, state: &AppState, secret: &str) -> bool {
    headers
        .get(&state.auth_header)
        .is_some_and(|provided| secrets_match(secret.as_bytes(), provided.as_bytes()))
}

/// Constant-time comparison of the configured secret and a provided value
///
/// Slices of different lengths compare unequal; only the length leaks.
pub fn secrets_match(expected: &[u8], provided: &[u8]) -> bool {
    expected.ct_eq(provided).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secrets_match() {
        assert!(secrets_match(b"s3cret", b"s3cret"));
        assert!(!secrets_match(b"s3cret", b"s3creT"));
        assert!(!secrets_match(b"s3cret", b"s3cret-longer"));
        assert!(!secrets_match(b"s3cret", b""));
    }

    #[test]
    fn test_context_fallback_mints_id() {
        let id = CorrelationId::new();
        let context = RequestContext { correlation_id: id };
        assert_eq!(RequestContext::correlation_id_or_new(Some(&context)), id);
        assert_ne!(RequestContext::correlation_id_or_new(None), id);
    }
}
