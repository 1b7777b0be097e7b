use sqlx::{Pool, Sqlite, SqlitePool};
use std::path::Path;
use tracing::{debug, info};

pub mod error;
pub mod init;
pub mod memory;
pub mod models;
pub mod password;
pub mod store;

pub use error::{DatabaseError, Result};

pub use memory::MemoryStore;
pub use models::{
    generate_id, Resource, ResourceKind, Role, User, SYSTEM_RESOURCE_ID, SYSTEM_RESOURCE_NAME,
};
pub use store::CredentialStore;

// Re-export initialization functions for convenience
pub use init::{initialize_database, DatabaseConfig};

/// Database connection pool
#[derive(Debug)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Create a new database connection
    pub async fn new(database_path: &str) -> Result<Self> {
        // Ensure the data directory exists
        if let Some(parent) = Path::new(database_path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        info!("Connecting to database at: {}", database_path);

        let connection_string =
            if database_path.starts_with("sqlite:") || database_path.starts_with(":memory:") {
                database_path.to_string()
            } else if database_path.starts_with('/') {
                format!("sqlite://{}", database_path)
            } else {
                format!("sqlite:{}", database_path)
            };

        debug!("Using connection string: {}", connection_string);

        let pool = SqlitePool::connect(&connection_string).await?;

        debug!("Database connection established");

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Create the users and resources tables if they are missing
    pub async fn create_tables(&self) -> Result<()> {
        info!("Creating drive tables");

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY NOT NULL,
                name TEXT NOT NULL UNIQUE,
                role TEXT NOT NULL,
                permissions TEXT NOT NULL DEFAULT '[]',
                password TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS resources (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                owner_id TEXT NOT NULL,
                shared_ids TEXT NOT NULL DEFAULT '[]',
                location TEXT NOT NULL DEFAULT '',
                kind TEXT NOT NULL,
                content TEXT NOT NULL DEFAULT '[]'
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_resources_unique_name ON resources(name)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Check if a table exists
    pub async fn table_exists(&self, table_name: &str) -> Result<bool> {
        let query = r#"
            SELECT COUNT(*) as count
            FROM sqlite_master
            WHERE type='table' AND name=?
        "#;

        let result: (i32,) = sqlx::query_as(query)
            .bind(table_name)
            .fetch_one(&self.pool)
            .await?;

        Ok(result.0 > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn create_test_db(dir: &TempDir) -> Database {
        let db_path = dir.path().join("test.db");

        // Create the database file first (SQLite requires this)
        std::fs::File::create(&db_path).unwrap();

        Database::new(db_path.to_str().unwrap()).await.unwrap()
    }

    #[tokio::test]
    async fn test_database_connection() {
        let dir = TempDir::new().unwrap();
        let db = create_test_db(&dir).await;
        assert!(db.pool().acquire().await.is_ok());
    }

    #[tokio::test]
    async fn test_create_tables() {
        let dir = TempDir::new().unwrap();
        let db = create_test_db(&dir).await;

        db.create_tables().await.unwrap();
        // Idempotent
        db.create_tables().await.unwrap();

        assert!(db.table_exists("users").await.unwrap());
        assert!(db.table_exists("resources").await.unwrap());
        assert!(!db.table_exists("non_existent_table").await.unwrap());
    }
}
