use axum::{extract::State, response::IntoResponse, Json};
use chrono::Utc;
use database::SYSTEM_RESOURCE_ID;
use tracing::debug;

use crate::{
    error::ApiResult,
    models::{HealthResponse, StoreHealth},
    AppState, ApiDoc,
};

/// Health check endpoint
///
/// GET /api/v1/health
#[utoipa::path(
    get,
    path = "/api/v1/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 401, description = "Missing or invalid token", body = ApiErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "health"
)]
pub async fn health_check(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    debug!("Health check requested");

    // The drive root is seeded at startup, so it doubles as a connectivity probe
    let store = match state.store.find_resource_by_id(SYSTEM_RESOURCE_ID).await {
        Ok(_) => StoreHealth {
            connected: true,
            message: "Credential store reachable".to_string(),
        },
        Err(e) => StoreHealth {
            connected: false,
            message: format!("Credential store check failed: {}", e),
        },
    };

    let response = HealthResponse {
        status: if store.connected {
            "healthy".to_string()
        } else {
            "degraded".to_string()
        },
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
        store,
    };

    Ok(Json(response))
}

/// OpenAPI document
///
/// GET /api/v1/openapi.json
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    use utoipa::OpenApi;
    Json(ApiDoc::openapi())
}
