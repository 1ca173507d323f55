use crate::AppState;
use crate::middleware::RequestContext;
use axum::{Extension, Json, Router, extract::State, routing::get};
use bucketgate_common::CorrelationId;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub buckets: usize,
    pub correlation_id: CorrelationId,
}

/// Liveness check; needs no credentials
#[instrument(skip_all, fields(correlation_id))]
async fn health_check(
    State(state): State<AppState>,
    context: Option<Extension<RequestContext>>,
) -> Json<HealthResponse> {
    let correlation_id = RequestContext::correlation_id_or_new(context.as_deref());
    tracing::Span::current().record("correlation_id", correlation_id.to_string());

    info!(correlation_id = %correlation_id, "Health check request");

    Json(HealthResponse {
        status: "healthy".to_string(),
        service: state.service_name.to_string(),
        buckets: state.registry.len(),
        correlation_id,
    })
}
