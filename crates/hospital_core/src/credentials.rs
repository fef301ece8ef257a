//! Password hashing and token key generation.

use anyhow::anyhow;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use rand::rngs::OsRng;
use rand::RngCore;

use crate::error::HospitalError;

/// Token keys are 20 random bytes, hex encoded (40 characters).
pub const TOKEN_KEY_BYTES: usize = 20;

/// Hash a password into an argon2id PHC string.
pub fn hash_password(password: &str) -> Result<String, HospitalError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| HospitalError::Internal(anyhow!("password hashing failed: {e}")))
}

/// Check a password against a stored PHC string. A malformed stored hash
/// is an internal error, a mismatch is `Ok(false)`.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, HospitalError> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|e| HospitalError::Internal(anyhow!("stored password hash is invalid: {e}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// [`hash_password`] on the blocking pool, keeping argon2 off the async workers.
pub async fn hash_password_blocking(password: String) -> Result<String, HospitalError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| HospitalError::Internal(anyhow!("password hashing task failed: {e}")))?
}

/// [`verify_password`] on the blocking pool.
pub async fn verify_password_blocking(
    password: String,
    stored_hash: String,
) -> Result<bool, HospitalError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &stored_hash))
        .await
        .map_err(|e| HospitalError::Internal(anyhow!("password verification task failed: {e}")))?
}

pub fn generate_token_key() -> String {
    let mut bytes = [0u8; TOKEN_KEY_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}
