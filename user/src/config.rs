//! Secrets and lifetimes for the authentication services

use chrono::Duration;
use std::env;
use tracing::warn;

use crate::error::{AuthError, Result};

/// Fallback used when a secret is not configured. Deployments must override it.
pub const DEFAULT_SECRET: &str = "drive-insecure-development-secret";

/// Default bearer token lifetime
pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 72;

/// Longest accepted token lifetime (a century)
pub const MAX_TOKEN_TTL_HOURS: i64 = 24 * 365 * 100;

/// Authentication configuration
#[derive(Clone)]
pub struct AuthConfig {
    /// HMAC secret for session tokens
    pub jwt_secret: Vec<u8>,
    /// HMAC secret for capability keys, distinct from the token secret
    pub key_secret: Vec<u8>,
    /// Session token lifetime in hours
    pub token_ttl_hours: i64,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("key_secret", &"<redacted>")
            .field("token_ttl_hours", &self.token_ttl_hours)
            .finish()
    }
}

impl AuthConfig {
    pub fn new(jwt_secret: impl Into<Vec<u8>>, key_secret: impl Into<Vec<u8>>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            key_secret: key_secret.into(),
            token_ttl_hours: DEFAULT_TOKEN_TTL_HOURS,
        }
    }

    /// Load configuration from the environment (and `.env` when present).
    ///
    /// Reads `JWT_SECRET`, `SECRET_KEY` and `TOKEN_TTL_HOURS`.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let token_ttl_hours = match env::var("TOKEN_TTL_HOURS") {
            Ok(raw) => raw.parse::<i64>().ok().filter(|hours| *hours > 0).ok_or_else(|| {
                AuthError::Configuration(format!("TOKEN_TTL_HOURS is not a positive integer: {}", raw))
            })?,
            Err(_) => DEFAULT_TOKEN_TTL_HOURS,
        };

        let config = Self {
            jwt_secret: Self::load_secret("JWT_SECRET"),
            key_secret: Self::load_secret("SECRET_KEY"),
            token_ttl_hours,
        };
        config.token_ttl()?;
        Ok(config)
    }

    /// The token lifetime as a duration.
    ///
    /// Fails unless the lifetime is between one hour and
    /// [`MAX_TOKEN_TTL_HOURS`].
    pub fn token_ttl(&self) -> Result<Duration> {
        let hours = self.token_ttl_hours;
        if !(1..=MAX_TOKEN_TTL_HOURS).contains(&hours) {
            return Err(AuthError::Configuration(format!(
                "token lifetime must be between 1 and {} hours, got {}",
                MAX_TOKEN_TTL_HOURS, hours
            )));
        }
        Duration::try_hours(hours).ok_or_else(|| {
            AuthError::Configuration(format!("token lifetime of {} hours is out of range", hours))
        })
    }

    fn load_secret(var: &str) -> Vec<u8> {
        match env::var(var) {
            Ok(value) if !value.is_empty() => value.into_bytes(),
            _ => {
                warn!(
                    "{} not set. Falling back to the built-in development secret; set it before deploying.",
                    var
                );
                DEFAULT_SECRET.as_bytes().to_vec()
            }
        }
    }

    pub fn with_token_ttl_hours(mut self, hours: i64) -> Self {
        self.token_ttl_hours = hours;
        self
    }

    /// Whether either secret is still the built-in fallback
    pub fn uses_default_secrets(&self) -> bool {
        self.jwt_secret == DEFAULT_SECRET.as_bytes() || self.key_secret == DEFAULT_SECRET.as_bytes()
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self::new(DEFAULT_SECRET, DEFAULT_SECRET)
    }
}
