use axum::{
    async_trait,
    body::Body,
    extract::{FromRequestParts, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use database::User;
use std::time::Instant;
use tracing::{debug, info, warn};
use user::bearer_token;

use crate::{error::ApiError, AppState};

/// Paths reachable without a bearer token. Matched by exact equality.
pub const PUBLIC_PATHS: &[&str] = &["/api/v1/auth/login", "/api/v1/auth/logout"];

/// Id of the user whose token passed the gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser(pub String);

pub fn is_public_path(path: &str) -> bool {
    PUBLIC_PATHS.contains(&path)
}

/// Authentication gate
///
/// Every request outside [`PUBLIC_PATHS`] must carry a valid, unrevoked
/// bearer token. On success the token's user id is attached to the request
/// as an [`AuthenticatedUser`] extension; otherwise the request ends with 401.
pub async fn authentication_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    if is_public_path(&path) {
        debug!("AUTH GATE: {} {} is public", method, path);
        return Ok(next.run(request).await);
    }

    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    let token = bearer_token(header);

    match state.auth.tokens().user_id_of(token) {
        Ok(user_id) => {
            info!("AUTH GATE: Access ALLOWED for {} {} {}", user_id, method, path);
            request.extensions_mut().insert(AuthenticatedUser(user_id));
            Ok(next.run(request).await)
        }
        Err(e) => {
            warn!("AUTH GATE: Access DENIED for {} {}: {}", method, path, e);
            Err(e.into())
        }
    }
}

/// The full user record behind the authenticated request
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let AuthenticatedUser(user_id) = parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| ApiError::Unauthorized("no authenticated user".to_string()))?;

        match state.store.find_user_by_id(&user_id).await {
            Ok(user) => Ok(CurrentUser(user)),
            // A valid token for a user that no longer exists
            Err(e) if e.is_not_found() => Err(ApiError::Unauthorized(format!(
                "unknown user {}",
                user_id
            ))),
            Err(e) => Err(e.into()),
        }
    }
}

/// Request processing middleware hook
/// Logs every request and how long it took
pub async fn request_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    debug!("REQUEST MIDDLEWARE: Processing incoming {} request to {}", method, uri);

    let response = next.run(request).await;

    info!(
        "{} {} -> {} in {:?}",
        method,
        uri.path(),
        response.status().as_u16(),
        start.elapsed()
    );

    response
}

/// Response processing middleware hook
/// Stamps every response, rejections included, with the server version
pub async fn response_middleware(request: Request<Body>, next: Next) -> Response {
    let mut response = next.run(request).await;

    response.headers_mut().insert(
        "X-Drive-Version",
        HeaderValue::from_static(env!("CARGO_PKG_VERSION")),
    );

    response
}
