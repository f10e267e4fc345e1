//! Health check endpoint.

use axum::Json;

use crate::api::types::HealthResponse;

/// `GET /api/health`: liveness check. Does not contact the model provider.
pub async fn check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: crate::config::APP_VERSION,
    })
}
