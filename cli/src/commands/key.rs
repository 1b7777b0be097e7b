use anyhow::{anyhow, Result};
use colored::*;
use user::{AuthConfig, CapabilityKeyService};

fn key_service() -> Result<CapabilityKeyService> {
    let config = AuthConfig::from_env()?;
    Ok(CapabilityKeyService::new(config.key_secret))
}

/// Print a new capability key for `user_id`
pub fn derive(user_id: String, length: usize) -> Result<()> {
    if length == 0 {
        return Err(anyhow!("length must be at least 1"));
    }
    let key = key_service()?.derive(&user_id, length)?;
    println!("{}", key);
    Ok(())
}

/// Check a key against `user_id`; an invalid key is an error exit
pub fn verify(key: String, user_id: String) -> Result<()> {
    if key_service()?.verify(&key, &user_id) {
        println!("{} key is valid for {}", "✓".green(), user_id);
        Ok(())
    } else {
        Err(anyhow!("key is not valid for {}", user_id))
    }
}
