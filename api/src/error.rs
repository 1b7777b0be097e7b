use authz::AuthzError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use database::DatabaseError;
use drive::DriveError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use user::AuthError;

/// API Error types
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

/// Error response structure for OpenAPI documentation
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ApiErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl ApiError {
    /// Convert error to HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get error code for the error type
    pub fn error_code(&self) -> &str {
        match self {
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::DatabaseError(_) => "DATABASE_ERROR",
            ApiError::InternalError(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        // Store failures are logged in full but reported generically
        let message = match &self {
            ApiError::DatabaseError(detail) | ApiError::InternalError(detail) => {
                tracing::error!("{}: {}", self.error_code(), detail);
                "internal error".to_string()
            }
            _ => self.to_string(),
        };
        let error_response = ApiErrorResponse {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message,
            },
        };

        (status, Json(error_response)).into_response()
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound(what) => ApiError::NotFound(what),
            DatabaseError::Duplicate(_) => ApiError::Conflict(err.to_string()),
            other => ApiError::DatabaseError(other.to_string()),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Database(e) => e.into(),
            AuthError::KeyGeneration(_) | AuthError::Configuration(_) => {
                ApiError::InternalError(err.to_string())
            }
            other => ApiError::Unauthorized(other.to_string()),
        }
    }
}

impl From<AuthzError> for ApiError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::PermissionDenied { .. } => ApiError::Forbidden(err.to_string()),
            other => ApiError::InternalError(other.to_string()),
        }
    }
}

impl From<DriveError> for ApiError {
    fn from(err: DriveError) -> Self {
        match err {
            DriveError::Conflict(_) | DriveError::NotAFolder(_) | DriveError::NotAFile(_) => {
                ApiError::Conflict(err.to_string())
            }
            DriveError::PermissionDenied(e) => e.into(),
            DriveError::NotFound(what) => ApiError::NotFound(what),
            DriveError::Store(e) => ApiError::DatabaseError(e.to_string()),
            DriveError::Io(e) => ApiError::InternalError(e.to_string()),
        }
    }
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let denied: ApiError = AuthzError::PermissionDenied {
            action: "read".into(),
            resource: "doc".into(),
        }
        .into();
        assert_eq!(denied.status_code(), StatusCode::FORBIDDEN);

        let conflict: ApiError = DriveError::Conflict("folder docs is not empty".into()).into();
        assert_eq!(conflict.status_code(), StatusCode::CONFLICT);

        let nested: ApiError = DriveError::PermissionDenied(AuthzError::PermissionDenied {
            action: "delete".into(),
            resource: "doc".into(),
        })
        .into();
        assert_eq!(nested.status_code(), StatusCode::FORBIDDEN);

        let missing: ApiError = DatabaseError::NotFound("resource docs".into()).into();
        assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);

        let store: ApiError = DriveError::Store(DatabaseError::Other("boom".into())).into();
        assert_eq!(store.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        for auth in [AuthError::MissingToken, AuthError::Expired, AuthError::Revoked] {
            assert_eq!(ApiError::from(auth).status_code(), StatusCode::UNAUTHORIZED);
        }
    }
}
