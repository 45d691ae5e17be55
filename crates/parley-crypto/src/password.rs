//! Password hashing with Argon2id.
//!
//! Hashes are stored as PHC strings, so the per-user salt and the cost
//! parameters travel inside the hash itself and verification needs no
//! extra columns. Verification is constant-time inside the argon2
//! crate.

use argon2::password_hash::{rand_core::OsRng, PasswordHash, SaltString};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};

use crate::{CryptoError, Result};

/// Hash a password with a fresh random salt.
///
/// # Errors
///
/// Returns [`CryptoError::PasswordHash`] if the hashing machinery fails
/// (it does not fail on any particular password content).
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| CryptoError::PasswordHash(e.to_string()))?;
    Ok(hash.to_string())
}

/// Verify a password against a stored PHC string.
///
/// An unparseable stored hash verifies as false rather than erroring;
/// a corrupt row must not distinguish itself from a wrong password.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}
