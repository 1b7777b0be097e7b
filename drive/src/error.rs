use authz::AuthzError;
use database::DatabaseError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DriveError {
    /// A structural precondition does not hold (non-empty folder, system resource)
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("{0} is not a folder")]
    NotAFolder(String),

    #[error("{0} is not a file")]
    NotAFile(String),

    #[error(transparent)]
    PermissionDenied(#[from] AuthzError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Store error: {0}")]
    Store(DatabaseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<DatabaseError> for DriveError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound(what) => DriveError::NotFound(what),
            DatabaseError::Duplicate(what) => {
                DriveError::Conflict(format!("{} already exists", what))
            }
            other => DriveError::Store(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, DriveError>;
