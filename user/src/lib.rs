//! Authentication for the drive: session tokens, revocation and capability keys

pub mod auth;
pub mod config;
pub mod error;

pub use auth::{
    bearer_token, AuthManager, CapabilityKeyService, Claims, RevocationList, TokenService,
    DEFAULT_KEY_BYTES,
};
pub use config::AuthConfig;
pub use error::{AuthError, Result};
