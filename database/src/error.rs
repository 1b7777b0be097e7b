use thiserror::Error;

pub type Result<T> = std::result::Result<T, DatabaseError>;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Database connection error: {0}")]
    Connection(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    /// A uniqueness constraint on a name or id was violated
    #[error("Already exists: {0}")]
    Duplicate(String),

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error("Other error: {0}")]
    Other(String),
}

impl DatabaseError {
    /// Whether this error means the record simply does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, DatabaseError::NotFound(_))
    }
}

/// Map a unique constraint violation to [`DatabaseError::Duplicate`]
pub(crate) fn duplicate_on_conflict(err: sqlx::Error, what: String) -> DatabaseError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => DatabaseError::Duplicate(what),
        _ => DatabaseError::Connection(err),
    }
}
