//! Signed bearer tokens for API sessions

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use super::revocation::RevocationList;
use crate::error::{AuthError, Result};

/// Claims carried by every session token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: String,
    pub authorized: bool,
    /// Expiry as a unix timestamp (seconds)
    pub exp: i64,
}

/// Issues and validates HMAC-signed session tokens.
///
/// Only the HMAC family is accepted on the way in; a token whose header
/// names any other algorithm is rejected before its signature is checked.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
    revocations: Arc<RevocationList>,
}

impl TokenService {
    pub fn new(secret: &[u8], ttl: Duration, revocations: Arc<RevocationList>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            ttl,
            revocations,
        }
    }

    /// Sign a fresh token for `user_id`, valid for the configured lifetime.
    pub fn issue(&self, user_id: &str) -> Result<String> {
        let expires_at = Utc::now().checked_add_signed(self.ttl).ok_or_else(|| {
            AuthError::Configuration("token lifetime overflows the clock".to_string())
        })?;
        let claims = Claims {
            user_id: user_id.to_string(),
            authorized: true,
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;
        debug!("Issued token for user {} expiring at {}", user_id, claims.exp);
        Ok(token)
    }

    /// Validate a token and return its claims.
    ///
    /// Checks run in order: presence, revocation, algorithm, signature,
    /// expiry, and finally the `authorized` claim.
    pub fn validate(&self, token: &str) -> Result<Claims> {
        if token.is_empty() {
            return Err(AuthError::MissingToken);
        }
        if self.revocations.is_revoked(token) {
            return Err(AuthError::Revoked);
        }
        self.verify(token)
    }

    /// Resolve the user id a valid token was issued to
    pub fn user_id_of(&self, token: &str) -> Result<String> {
        self.validate(token).map(|claims| claims.user_id)
    }

    /// Add a token to the revocation list. The token must still verify.
    pub fn revoke(&self, token: &str) -> Result<()> {
        if token.is_empty() {
            return Err(AuthError::MissingToken);
        }
        let claims = self.verify(token)?;
        self.revocations.revoke(token);
        info!("Revoked token for user {}", claims.user_id);
        Ok(())
    }

    pub fn is_revoked(&self, token: &str) -> bool {
        self.revocations.is_revoked(token)
    }

    fn verify(&self, token: &str) -> Result<Claims> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        if !data.claims.authorized {
            return Err(AuthError::InvalidToken("token is not authorized".to_string()));
        }
        Ok(data.claims)
    }
}

/// Strip the `Bearer ` scheme from an `Authorization` header value.
///
/// Returns an empty string when the header is absent or uses another scheme.
pub fn bearer_token(header: Option<&str>) -> &str {
    header
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .unwrap_or("")
}
