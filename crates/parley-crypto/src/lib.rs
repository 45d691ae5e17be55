//! # parley-crypto
//!
//! Cryptographic primitives for the Parley messaging server:
//!
//! - **At-rest message encryption** via [`cipher`]: ChaCha20-Poly1305
//!   keyed from the operator's passphrase, stored as a hex string.
//! - **Password hashing** via [`password`]: Argon2id PHC strings with
//!   per-user random salts.
//! - **Friend codes** via [`codes`]: short server-issued identifiers
//!   that address users without exposing their email.

pub mod cipher;
pub mod codes;
pub mod password;

/// Error types for cryptographic operations.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// AEAD encryption or decryption failed (for decryption this means
    /// the authentication tag did not verify).
    #[error("AEAD operation failed")]
    Aead,

    /// Stored ciphertext is not valid hex or is too short to contain a
    /// nonce.
    #[error("malformed stored ciphertext: {0}")]
    Malformed(String),

    /// Password hashing or verification machinery failed.
    #[error("password hash error: {0}")]
    PasswordHash(String),
}

/// Result type alias for crypto operations.
pub type Result<T> = std::result::Result<T, CryptoError>;
