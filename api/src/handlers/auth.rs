use axum::{
    extract::{Query, State},
    http::{header::AUTHORIZATION, HeaderMap},
    Extension, Json,
};
use tracing::info;
use user::{bearer_token, DEFAULT_KEY_BYTES};

use crate::{
    error::{ApiError, ApiResult},
    middleware_hooks::AuthenticatedUser,
    models::{
        KeyRequest, KeyResponse, KeyVerifyParams, KeyVerifyResponse, LoginRequest, LoginResponse,
        SuccessResponse,
    },
    AppState,
};

/// Largest accepted random part of a capability key, in bytes
pub const MAX_KEY_BYTES: usize = 256;

/// Exchange credentials for a bearer token
///
/// POST /api/v1/auth/login
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = ApiErrorResponse)
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let (_, token) = state
        .auth
        .login(state.store.as_ref(), &request.username, &request.password)
        .await?;

    Ok(Json(LoginResponse { token }))
}

/// Revoke the presented bearer token
///
/// POST /api/v1/auth/logout
#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    responses(
        (status = 200, description = "Token revoked", body = SuccessResponse),
        (status = 401, description = "Token missing or invalid", body = ApiErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<SuccessResponse>> {
    let header = headers.get(AUTHORIZATION).and_then(|value| value.to_str().ok());
    state.auth.logout(bearer_token(header))?;

    Ok(Json(SuccessResponse {
        success: true,
        message: "Logged out successfully".to_string(),
    }))
}

/// Derive a capability key for the calling user
///
/// POST /api/v1/auth/keys
#[utoipa::path(
    post,
    path = "/api/v1/auth/keys",
    request_body = KeyRequest,
    responses(
        (status = 200, description = "Key derived", body = KeyResponse),
        (status = 400, description = "Length out of range", body = ApiErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
pub async fn create_key(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user_id)): Extension<AuthenticatedUser>,
    request: Option<Json<KeyRequest>>,
) -> ApiResult<Json<KeyResponse>> {
    let length = request
        .and_then(|Json(request)| request.length)
        .unwrap_or(DEFAULT_KEY_BYTES);
    if !(1..=MAX_KEY_BYTES).contains(&length) {
        return Err(ApiError::BadRequest(format!(
            "length must be between 1 and {}",
            MAX_KEY_BYTES
        )));
    }

    let key = state.auth.keys().derive(&user_id, length)?;
    info!("Derived capability key for {}", user_id);

    Ok(Json(KeyResponse { key }))
}

/// Check a capability key against the calling user
///
/// GET /api/v1/auth/keys/verify?key=
#[utoipa::path(
    get,
    path = "/api/v1/auth/keys/verify",
    params(("key" = String, Query, description = "Capability key to check")),
    responses(
        (status = 200, description = "Verification result", body = KeyVerifyResponse)
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
pub async fn verify_key(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user_id)): Extension<AuthenticatedUser>,
    Query(params): Query<KeyVerifyParams>,
) -> Json<KeyVerifyResponse> {
    Json(KeyVerifyResponse {
        valid: state.auth.keys().verify(&params.key, &user_id),
    })
}
