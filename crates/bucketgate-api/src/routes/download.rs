//! `POST /download`: stream an object back as an attachment

use crate::middleware::RequestContext;
use crate::routes::json_error;
use crate::routes::response::ObjectRequest;
use crate::{ApiError, ApiResult, AppState};
use axum::{
    Extension, Json, Router,
    body::Body,
    extract::{State, rejection::JsonRejection},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};
use bucketgate_storage::DEFAULT_CONTENT_TYPE;
use tracing::{info, instrument};

pub fn routes() -> Router<AppState> {
    Router::new().route("/download", post(download_handler))
}

/// Download a file
///
/// # Errors
///
/// - 400 for a malformed body, an unknown bucket, or an empty name
/// - 404 when no object exists under the key
/// - 502 when the storage backend fails
#[instrument(skip_all, fields(correlation_id, bucket, key))]
pub async fn download_handler(
    State(state): State<AppState>,
    context: Option<Extension<RequestContext>>,
    request: Result<Json<ObjectRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let correlation_id = RequestContext::correlation_id_or_new(context.as_deref());
    tracing::Span::current().record("correlation_id", correlation_id.to_string());

    let Json(request) = request.map_err(|e| json_error(&e, correlation_id))?;

    let bucket = state
        .registry
        .resolve(request.bucket_name.as_deref())
        .map_err(|e| ApiError::from_storage(e, correlation_id))?;
    let key = state.object_key(&request.file_name, request.folder.as_deref(), correlation_id)?;

    let span = tracing::Span::current();
    span.record("bucket", bucket.name.as_str());
    span.record("key", key.as_str());

    let object = bucket
        .storage
        .get(&key)
        .await
        .map_err(|e| ApiError::from_storage(e, correlation_id))?;

    info!(
        correlation_id = %correlation_id,
        bucket = %bucket.name,
        key = %key,
        size = object.size,
        "Object served"
    );

    let content_type = HeaderValue::from_str(&object.content_type)
        .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_CONTENT_TYPE));
    // Sanitized names contain no quotes or control characters
    let disposition = HeaderValue::from_str(&format!(
        "attachment; filename=\"{}\"",
        key.file_name()
    ))
    .unwrap_or_else(|_| HeaderValue::from_static("attachment"));

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        Body::from(object.bytes),
    )
        .into_response())
}
