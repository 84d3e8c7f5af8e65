//! Health check.

use axum::Json;

use crate::web::dto::HealthResponse;

/// GET /api/health - Liveness check.
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "health",
    responses(
        (status = 200, description = "Server is up", body = HealthResponse)
    )
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        message: "Server is healthy".to_string(),
    })
}
