//! `POST /delete`: remove an object from an allow-listed bucket
//!
//! The name goes through the same sanitizer as uploads, so deleting with the
//! name a client uploaded under addresses the object that upload created.
//! Deleting a missing object succeeds.

use crate::middleware::RequestContext;
use crate::routes::json_error;
use crate::routes::response::{DeleteResponse, ObjectRequest};
use crate::{ApiError, ApiResult, AppState};
use axum::{
    Extension, Json, Router,
    extract::{State, rejection::JsonRejection},
    routing::post,
};
use tracing::{info, instrument};

pub fn routes() -> Router<AppState> {
    Router::new().route("/delete", post(delete_handler))
}

/// Delete a file
///
/// # Errors
///
/// - 400 for a malformed body, an unknown bucket, or an empty name
/// - 502 when the storage backend fails
#[instrument(skip_all, fields(correlation_id, bucket, key))]
pub async fn delete_handler(
    State(state): State<AppState>,
    context: Option<Extension<RequestContext>>,
    request: Result<Json<ObjectRequest>, JsonRejection>,
) -> ApiResult<Json<DeleteResponse>> {
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

    bucket
        .storage
        .delete(&key)
        .await
        .map_err(|e| ApiError::from_storage(e, correlation_id))?;

    info!(
        correlation_id = %correlation_id,
        bucket = %bucket.name,
        key = %key,
        "Object deleted"
    );

    Ok(Json(DeleteResponse {
        success: true,
        message: "File deleted".to_string(),
        file_name: key.file_name().to_string(),
        key: key.to_string(),
        bucket: bucket.name.to_string(),
        correlation_id,
    }))
}
