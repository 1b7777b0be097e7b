use anyhow::{anyhow, Result};
use authz::Grant;
use colored::*;
use database::{
    generate_id, initialize_database, password::hash_password, CredentialStore, DatabaseConfig,
    User,
};
use std::path::PathBuf;

/// Create a user in the SQLite store
pub async fn add(
    database: PathBuf,
    name: String,
    password: String,
    role: String,
    permissions: Vec<String>,
) -> Result<()> {
    // Reject typos up front; the engine would silently skip them later
    for permission in &permissions {
        permission
            .parse::<Grant>()
            .map_err(|e| anyhow!("{}", e))?;
    }
    if password.is_empty() {
        return Err(anyhow!("password must not be empty"));
    }

    let db = initialize_database(DatabaseConfig::new_with_path(database)).await?;

    let user = User::new(generate_id(), name, role)
        .with_permissions(permissions)
        .with_password_hash(hash_password(&password)?);
    db.insert_user(&user)
        .await
        .map_err(|e| anyhow!("Failed to create user {}: {}", user.name, e))?;

    println!(
        "{} User {} created with id {}",
        "✓".green(),
        user.name.bold(),
        user.id
    );
    if !user.permissions.is_empty() {
        println!("  Permissions: {}", user.permissions.join(", "));
    }

    Ok(())
}
