use anyhow::{anyhow, Result};
use api::{start_server_with_config, ApiConfig, AppState};
use database::{
    generate_id, initialize_database, password::hash_password,
    CredentialStore, DatabaseConfig, MemoryStore, User,
};
use drive::FileStore;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use user::{AuthConfig, AuthManager};

/// Name of the account created by `--admin-password`
pub const BOOTSTRAP_ADMIN: &str = "admin";

pub struct ServeOptions {
    pub host: String,
    pub port: u16,
    pub database: PathBuf,
    pub files_root: PathBuf,
    pub memory: bool,
    pub admin_password: Option<String>,
}

/// Run the HTTP server until interrupted
pub async fn execute(options: ServeOptions) -> Result<()> {
    let auth_config = AuthConfig::from_env()?;

    let store: Arc<dyn CredentialStore> = if options.memory {
        warn!("Using the in-memory store; all data is lost on exit");
        Arc::new(MemoryStore::with_system_resource())
    } else {
        info!("Opening database at {:?}", options.database);
        initialize_database(DatabaseConfig::new_with_path(options.database.clone())).await?
    };

    if let Some(password) = options.admin_password.as_deref() {
        bootstrap_admin(store.as_ref(), password).await?;
    }

    let state = AppState::new(
        store,
        AuthManager::new(&auth_config)?,
        FileStore::new(&options.files_root),
    );
    let config = ApiConfig::new()
        .with_host(options.host)
        .with_port(options.port);

    start_server_with_config(state, config)
        .await
        .map_err(|e| anyhow!("API server error: {}", e))
}

/// Make sure an admin account exists for first logins
async fn bootstrap_admin(store: &dyn CredentialStore, password: &str) -> Result<()> {
    if store
        .find_user_by_credentials(BOOTSTRAP_ADMIN, password)
        .await
        .is_ok()
    {
        return Ok(());
    }

    let admin = User::new(generate_id(), BOOTSTRAP_ADMIN, "admin")
        .with_permissions(["all:all", "read:sys-all"])
        .with_password_hash(hash_password(password)?);

    match store.insert_user(&admin).await {
        Ok(()) => info!("Created bootstrap admin account {}", BOOTSTRAP_ADMIN),
        // Name already taken with a different password; leave it alone
        Err(e) => warn!("Could not create bootstrap admin: {}", e),
    }
    Ok(())
}
