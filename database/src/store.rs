//! The credential store contract and its SQLite implementation.

use async_trait::async_trait;
use sqlx::{sqlite::SqliteRow, Row};
use tracing::debug;

use crate::models::{Resource, ResourceKind, User};
use crate::error::duplicate_on_conflict;
use crate::password::verify_password;
use crate::{Database, DatabaseError, Result};

/// Persistence for users and resources.
///
/// Lookups that find nothing return [`DatabaseError::NotFound`]; every other
/// failure is an opaque store error.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_user_by_id(&self, id: &str) -> Result<User>;

    /// Look a user up by name and verify the password against the stored hash.
    /// An unknown name and a wrong password are indistinguishable.
    async fn find_user_by_credentials(&self, name: &str, password: &str) -> Result<User>;

    async fn find_resource_by_name(&self, name: &str) -> Result<Resource>;

    async fn find_resource_by_id(&self, id: &str) -> Result<Resource>;

    async fn insert_resource(&self, resource: &Resource) -> Result<()>;

    async fn delete_resource(&self, resource: &Resource) -> Result<()>;

    /// Append `child_id` to the parent's `content` list.
    async fn append_resource_child(&self, parent: &Resource, child_id: &str) -> Result<()>;

    /// Add `user_id` to the resource's shared list. Adding twice is a no-op.
    async fn append_shared_user(&self, resource: &Resource, user_id: &str) -> Result<()>;

    async fn insert_user(&self, user: &User) -> Result<()>;
}

fn user_from_row(row: &SqliteRow) -> Result<User> {
    let role: String = row.try_get("role")?;
    let permissions: String = row.try_get("permissions")?;

    Ok(User {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        role: role.into(),
        permissions: serde_json::from_str(&permissions)?,
        password: row.try_get("password")?,
    })
}

fn resource_from_row(row: &SqliteRow) -> Result<Resource> {
    let kind: String = row.try_get("kind")?;
    let shared_ids: String = row.try_get("shared_ids")?;
    let content: String = row.try_get("content")?;

    Ok(Resource {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        owner_id: row.try_get("owner_id")?,
        shared_ids: serde_json::from_str(&shared_ids)?,
        location: row.try_get("location")?,
        kind: kind.parse::<ResourceKind>()?,
        content: serde_json::from_str(&content)?,
    })
}

const RESOURCE_COLUMNS: &str = "id, name, owner_id, shared_ids, location, kind, content";

#[async_trait]
impl CredentialStore for Database {
    async fn find_user_by_id(&self, id: &str) -> Result<User> {
        let row = sqlx::query("SELECT id, name, role, permissions, password FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("user {}", id)))?;

        user_from_row(&row)
    }

    async fn find_user_by_credentials(&self, name: &str, password: &str) -> Result<User> {
        let row =
            sqlx::query("SELECT id, name, role, permissions, password FROM users WHERE name = ?")
                .bind(name)
                .fetch_optional(self.pool())
                .await?;

        let user = match row {
            Some(row) => user_from_row(&row)?,
            None => return Err(DatabaseError::NotFound("user".to_string())),
        };

        if !verify_password(password, &user.password) {
            debug!("Password mismatch for user {}", user.id);
            return Err(DatabaseError::NotFound("user".to_string()));
        }

        Ok(user)
    }

    async fn find_resource_by_name(&self, name: &str) -> Result<Resource> {
        let sql = format!(
            "SELECT {} FROM resources WHERE name = ? ORDER BY seq LIMIT 1",
            RESOURCE_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(name)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("resource {}", name)))?;

        resource_from_row(&row)
    }

    async fn find_resource_by_id(&self, id: &str) -> Result<Resource> {
        let sql = format!("SELECT {} FROM resources WHERE id = ?", RESOURCE_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("resource {}", id)))?;

        resource_from_row(&row)
    }

    async fn insert_resource(&self, resource: &Resource) -> Result<()> {
        let sql = format!(
            "INSERT INTO resources ({}) VALUES (?, ?, ?, ?, ?, ?, ?)",
            RESOURCE_COLUMNS
        );
        sqlx::query(&sql)
            .bind(&resource.id)
            .bind(&resource.name)
            .bind(&resource.owner_id)
            .bind(serde_json::to_string(&resource.shared_ids)?)
            .bind(&resource.location)
            .bind(resource.kind.as_str())
            .bind(serde_json::to_string(&resource.content)?)
            .execute(self.pool())
            .await
            .map_err(|e| duplicate_on_conflict(e, format!("resource {}", resource.name)))?;

        debug!("Inserted {} {} ({})", resource.kind, resource.name, resource.id);
        Ok(())
    }

    async fn delete_resource(&self, resource: &Resource) -> Result<()> {
        let result = sqlx::query("DELETE FROM resources WHERE id = ?")
            .bind(&resource.id)
            .execute(self.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("resource {}", resource.id)));
        }

        debug!("Deleted resource {}", resource.id);
        Ok(())
    }

    async fn append_resource_child(&self, parent: &Resource, child_id: &str) -> Result<()> {
        // Single statement so concurrent appends queue on the write lock
        // instead of failing a read-to-write upgrade
        let result = sqlx::query(
            "UPDATE resources SET content = json_insert(content, '$[#]', ?) WHERE id = ?",
        )
        .bind(child_id)
        .bind(&parent.id)
        .execute(self.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("resource {}", parent.id)));
        }

        debug!("Linked child {} under {}", child_id, parent.id);
        Ok(())
    }

    async fn append_shared_user(&self, resource: &Resource, user_id: &str) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE resources SET shared_ids = json_insert(shared_ids, '$[#]', ?)
            WHERE id = ?
              AND NOT EXISTS (SELECT 1 FROM json_each(resources.shared_ids) WHERE value = ?)
            "#,
        )
        .bind(user_id)
        .bind(&resource.id)
        .bind(user_id)
        .execute(self.pool())
        .await?;

        if result.rows_affected() == 0 {
            // Either already shared or the resource is gone
            self.find_resource_by_id(&resource.id).await?;
        }
        Ok(())
    }

    async fn insert_user(&self, user: &User) -> Result<()> {
        sqlx::query(
            "INSERT INTO users (id, name, role, permissions, password) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&user.id)
        .bind(&user.name)
        .bind(user.role.as_str())
        .bind(serde_json::to_string(&user.permissions)?)
        .bind(&user.password)
        .execute(self.pool())
        .await
        .map_err(|e| duplicate_on_conflict(e, format!("user {}", user.name)))?;

        debug!("Inserted user {} ({})", user.name, user.id);
        Ok(())
    }
}
