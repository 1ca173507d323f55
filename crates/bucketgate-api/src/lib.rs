//! HTTP gateway for uploading, deleting and downloading objects in
//! allow-listed buckets behind a shared secret.

pub mod bootstrap;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiErrorResponse, ApiResult};
pub use middleware::{RequestContext, correlation_id_middleware, require_auth};
pub use state::AppState;
