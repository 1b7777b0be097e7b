//! Session and capability authentication

pub mod keys;
pub mod revocation;
pub mod token;

use database::{CredentialStore, DatabaseError, User};
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::AuthConfig;
use crate::error::{AuthError, Result};

pub use keys::{CapabilityKeyService, DEFAULT_KEY_BYTES};
pub use revocation::RevocationList;
pub use token::{bearer_token, Claims, TokenService};

/// Owns the token service, the capability key service and the revocation list
pub struct AuthManager {
    tokens: TokenService,
    keys: CapabilityKeyService,
    revocations: Arc<RevocationList>,
}

impl AuthManager {
    /// Fails when the configured token lifetime is out of range.
    pub fn new(config: &AuthConfig) -> Result<Self> {
        Self::with_revocations(config, Arc::new(RevocationList::new()))
    }

    pub fn with_revocations(config: &AuthConfig, revocations: Arc<RevocationList>) -> Result<Self> {
        if config.uses_default_secrets() {
            warn!("Authentication is using the built-in development secret");
        }

        Ok(Self {
            tokens: TokenService::new(
                &config.jwt_secret,
                config.token_ttl()?,
                Arc::clone(&revocations),
            ),
            keys: CapabilityKeyService::new(config.key_secret.clone()),
            revocations,
        })
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    pub fn keys(&self) -> &CapabilityKeyService {
        &self.keys
    }

    pub fn revocations(&self) -> &Arc<RevocationList> {
        &self.revocations
    }

    /// Check credentials and issue a session token.
    ///
    /// An unknown user and a wrong password are indistinguishable to the caller.
    pub async fn login(
        &self,
        store: &dyn CredentialStore,
        name: &str,
        password: &str,
    ) -> Result<(User, String)> {
        let user = match store.find_user_by_credentials(name, password).await {
            Ok(user) => user,
            Err(DatabaseError::NotFound(_)) => {
                warn!("Failed login attempt for {}", name);
                return Err(AuthError::InvalidCredentials);
            }
            Err(e) => return Err(e.into()),
        };

        let token = self.tokens.issue(&user.id)?;
        info!("User {} authenticated successfully", user.name);
        Ok((user, token))
    }

    /// Revoke a session token
    pub fn logout(&self, token: &str) -> Result<()> {
        self.tokens.revoke(token)
    }
}
