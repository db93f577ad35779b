//! Argon2 password hashing.
//!
//! Hashing is CPU-bound, so the async entry points hop onto the blocking
//! pool.

use argon2::password_hash::{PasswordHash, SaltString};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use rand::Rng;

pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_PASSWORD_LEN: usize = 128;

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    Hash(String),
    #[error("stored password hash is malformed: {0}")]
    Malformed(String),
    #[error("hashing task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Hash synchronously. Prefer [`hash`] from async code.
///
/// # Errors
///
/// Returns an error if salt encoding or hashing fails.
pub fn hash_blocking(password: &str) -> Result<String, PasswordError> {
    let salt_bytes: [u8; 16] = rand::rng().random();
    let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| PasswordError::Hash(e.to_string()))?;
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::Hash(e.to_string()))?;
    Ok(hash.to_string())
}

/// Verify synchronously. Prefer [`verify`] from async code.
///
/// # Errors
///
/// Returns an error only if the stored hash cannot be parsed; a wrong
/// password is `Ok(false)`.
pub fn verify_blocking(password: &str, stored_hash: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(stored_hash).map_err(|e| PasswordError::Malformed(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// # Errors
///
/// See [`hash_blocking`].
pub async fn hash(password: String) -> Result<String, PasswordError> {
    tokio::task::spawn_blocking(move || hash_blocking(&password)).await?
}

/// # Errors
///
/// See [`verify_blocking`].
pub async fn verify(password: String, stored_hash: String) -> Result<bool, PasswordError> {
    tokio::task::spawn_blocking(move || verify_blocking(&password, &stored_hash)).await?
}

/// Run one Argon2 pass over `password` and report no match. Sign-in calls
/// this when there is no stored hash, so a missing account costs the same
/// time as a wrong password.
///
/// # Errors
///
/// See [`hash_blocking`].
pub async fn verify_absent(password: String) -> Result<bool, PasswordError> {
    tokio::task::spawn_blocking(move || hash_blocking(&password).map(|_| false)).await?
}

#[cfg(test)]
#[path = "password_test.rs"]
mod tests;
