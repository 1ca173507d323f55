pub mod delete;
pub mod download;
pub mod health;
pub mod response;
pub mod upload;

pub use response::{DeleteResponse, ObjectRequest, UploadResponse};

use crate::middleware::{
    RequestContext, correlation_id_middleware, request_timeout, require_auth,
};
use crate::{ApiError, AppState};
use axum::{
    Extension, Router,
    extract::{DefaultBodyLimit, rejection::JsonRejection},
    http::{HeaderName, HeaderValue, Method, header},
    middleware,
};
use bucketgate_common::{CORRELATION_ID_HEADER, CorrelationId};
use bucketgate_config::ServerConfig;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the full router: public health check, authenticated object routes,
/// JSON 404 fallback, CORS, body limit, request timeout and correlation IDs
pub fn create_router(state: AppState, server: &ServerConfig) -> Router {
    let protected = Router::new()
        .merge(upload::routes())
        .merge(delete::routes())
        .merge(download::routes())
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let body_limit = usize::try_from(server.max_body_bytes).unwrap_or(usize::MAX);
    let timeout = Duration::from_secs(server.timeout_seconds);

    Router::new()
        .merge(health::routes())
        .merge(protected)
        .fallback(not_found)
        .method_not_allowed_fallback(not_found)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::from_fn_with_state(timeout, request_timeout))
        .layer(cors_layer(server, &state.auth_header))
        .layer(middleware::from_fn(correlation_id_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS policy: configured origin, `POST` and preflight only
pub fn cors_layer(server: &ServerConfig, auth_header: &HeaderName) -> CorsLayer {
    let origin = if server.allows_any_origin() {
        AllowOrigin::any()
    } else {
        let configured = server.allowed_origin.trim().trim_end_matches('/');
        HeaderValue::from_str(configured).map_or_else(
            |_| {
                tracing::warn!(
                    origin = %server.allowed_origin,
                    "Allowed origin is not a valid header value; cross-origin requests will be refused"
                );
                AllowOrigin::list(Vec::<HeaderValue>::new())
            },
            AllowOrigin::exact,
        )
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, auth_header.clone()])
        .expose_headers([
            HeaderName::from_static(CORRELATION_ID_HEADER),
            header::CONTENT_DISPOSITION,
        ])
        .max_age(Duration::from_secs(server.cors_max_age_seconds))
}

async fn not_found(context: Option<Extension<RequestContext>>) -> ApiError {
    ApiError::RouteNotFound {
        correlation_id: RequestContext::correlation_id_or_new(context.as_deref()),
    }
}

/// Map a JSON extractor rejection to a validation error
pub(crate) fn json_error(rejection: &JsonRejection, correlation_id: CorrelationId) -> ApiError {
    ApiError::validation(
        format!("Invalid JSON body: {}", rejection.body_text()),
        None,
        correlation_id,
    )
}
