//! Capability keys: random-salted HMAC tokens bound to a user id

use base64::{engine::general_purpose::URL_SAFE, Engine};
use hmac::{Hmac, Mac};
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::error::{AuthError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Default number of random bytes in a derived key
pub const DEFAULT_KEY_BYTES: usize = 32;

/// Derives and verifies keys of the form `"<hexRandom>:<base64Signature>"`.
///
/// The signature is an HMAC-SHA256 over `hex(sha256(userId)) + ":" + hexRandom`,
/// so a key verifies only for the user it was derived for.
#[derive(Clone)]
pub struct CapabilityKeyService {
    secret: Vec<u8>,
}

impl CapabilityKeyService {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Derive a new key for `user_id` using `len` random bytes.
    pub fn derive(&self, user_id: &str, len: usize) -> Result<String> {
        let mut salt = vec![0u8; len];
        OsRng
            .try_fill_bytes(&mut salt)
            .map_err(|e| AuthError::KeyGeneration(e.to_string()))?;

        let random = hex::encode(&salt);
        let signature = self.sign(user_id, &random)?;
        Ok(format!("{}:{}", random, signature))
    }

    /// Check a key against `user_id` in constant time.
    pub fn verify(&self, key: &str, user_id: &str) -> bool {
        let parts: Vec<&str> = key.split(':').collect();
        if parts.len() != 2 {
            return false;
        }

        match self.sign(user_id, parts[0]) {
            Ok(expected) => expected.as_bytes().ct_eq(parts[1].as_bytes()).into(),
            Err(_) => false,
        }
    }

    fn sign(&self, user_id: &str, random: &str) -> Result<String> {
        let user_hash = hex::encode(Sha256::digest(user_id.as_bytes()));

        let mut mac = <HmacSha256 as Mac>::new_from_slice(&self.secret)
            .map_err(|e| AuthError::KeyGeneration(e.to_string()))?;
        mac.update(user_hash.as_bytes());
        mac.update(b":");
        mac.update(random.as_bytes());

        Ok(URL_SAFE.encode(mac.finalize().into_bytes()))
    }
}
