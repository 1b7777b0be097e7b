use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Missing bearer token")]
    MissingToken,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token expired")]
    Expired,

    #[error("Token revoked")]
    Revoked,

    #[error("Signing algorithm not allowed")]
    UnauthorizedAlgorithm,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Key generation failed: {0}")]
    KeyGeneration(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Database error: {0}")]
    Database(#[from] database::DatabaseError),
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::ExpiredSignature => AuthError::Expired,
            ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
                AuthError::UnauthorizedAlgorithm
            }
            _ => AuthError::InvalidToken(err.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, AuthError>;
