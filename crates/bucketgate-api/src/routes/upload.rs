//! `POST /upload`: store a multipart file part in an allow-listed bucket
//!
//! Fields: `file` (required file part), `fileName`, `bucketName` and
//! `folder` (optional text). The stored name is the first non-empty of
//! `fileName`, the file part's own filename, and `upload-<unix millis>`,
//! always passed through the sanitizer.

use crate::middleware::RequestContext;
use crate::routes::response::UploadResponse;
use crate::{ApiError, ApiResult, AppState};
use axum::{
    Extension, Json, Router,
    extract::{Multipart, State, multipart::MultipartRejection},
    http::StatusCode,
    routing::post,
};
use bucketgate_common::CorrelationId;
use bucketgate_keys::fallback_name;
use bucketgate_storage::guess_content_type;
use bytes::Bytes;
use std::fmt::Display;
use tracing::{info, instrument};

pub fn routes() -> Router<AppState> {
    Router::new().route("/upload", post(upload_handler))
}

/// The `file` part of an upload
#[derive(Debug)]
struct FilePart {
    original_name: String,
    content_type: Option<String>,
    bytes: Bytes,
}

/// Every recognized field of the upload form
#[derive(Debug, Default)]
struct UploadForm {
    file: Option<FilePart>,
    file_name: Option<String>,
    bucket_name: Option<String>,
    folder: Option<String>,
}

/// Empty strings count as absent; whitespace is a name like any other
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn multipart_error(
    status: StatusCode,
    detail: impl Display,
    correlation_id: CorrelationId,
) -> ApiError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge { correlation_id }
    } else {
        ApiError::validation(
            format!("Malformed multipart body: {detail}"),
            None,
            correlation_id,
        )
    }
}

async fn read_form(mut multipart: Multipart, correlation_id: CorrelationId) -> ApiResult<UploadForm> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e.status(), e.body_text(), correlation_id))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if name == "file" {
            // A part without a filename is a plain text field, not a file
            let Some(original_name) = field.file_name().map(str::to_string) else {
                return Err(ApiError::validation(
                    "Invalid file",
                    Some("file"),
                    correlation_id,
                ));
            };
            let content_type = field.content_type().map(str::to_string);
            let bytes = field
                .bytes()
                .await
                .map_err(|e| multipart_error(e.status(), e.body_text(), correlation_id))?;

            form.file = Some(FilePart {
                original_name,
                content_type,
                bytes,
            });
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| multipart_error(e.status(), e.body_text(), correlation_id))?;
        match name.as_str() {
            "fileName" => form.file_name = Some(value),
            "bucketName" => form.bucket_name = Some(value),
            "folder" => form.folder = Some(value),
            _ => {}
        }
    }

    Ok(form)
}

/// Upload a file
///
/// # Errors
///
/// - 400 for a malformed body, a missing or non-file `file` part, an
///   unknown bucket, or a name that sanitizes to nothing
/// - 413 when the body exceeds the configured limit
/// - 502 when the storage backend fails
#[instrument(skip_all, fields(correlation_id, bucket, key))]
pub async fn upload_handler(
    State(state): State<AppState>,
    context: Option<Extension<RequestContext>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<UploadResponse>> {
    let correlation_id = RequestContext::correlation_id_or_new(context.as_deref());
    tracing::Span::current().record("correlation_id", correlation_id.to_string());

    let multipart =
        multipart.map_err(|e| multipart_error(e.status(), e.body_text(), correlation_id))?;
    let form = read_form(multipart, correlation_id).await?;

    let Some(file) = form.file else {
        return Err(ApiError::validation(
            "Invalid file",
            Some("file"),
            correlation_id,
        ));
    };

    let bucket = state
        .registry
        .resolve(form.bucket_name.as_deref())
        .map_err(|e| ApiError::from_storage(e, correlation_id))?;

    let requested_name = non_empty(form.file_name)
        .or_else(|| non_empty(Some(file.original_name)))
        .unwrap_or_else(|| fallback_name(chrono::Utc::now().timestamp_millis()));

    let key = state.object_key(&requested_name, form.folder.as_deref(), correlation_id)?;

    let span = tracing::Span::current();
    span.record("bucket", bucket.name.as_str());
    span.record("key", key.as_str());

    let content_type =
        non_empty(file.content_type).unwrap_or_else(|| guess_content_type(key.as_str()));

    let stored = bucket
        .storage
        .put(&key, file.bytes, &content_type)
        .await
        .map_err(|e| ApiError::from_storage(e, correlation_id))?;

    let public_url = state
        .public_urls
        .as_ref()
        .map(|urls| urls.build(bucket.name.as_str(), &key));

    info!(
        correlation_id = %correlation_id,
        bucket = %bucket.name,
        key = %key,
        size = stored.size,
        "Upload stored"
    );

    Ok(Json(UploadResponse {
        success: true,
        message: "Upload successful".to_string(),
        file_name: key.file_name().to_string(),
        key: stored.key,
        bucket: bucket.name.to_string(),
        size: stored.size,
        content_type: stored.content_type,
        public_url,
        correlation_id,
    }))
}
