//! At-rest message encryption.
//!
//! Each message body is sealed independently with ChaCha20-Poly1305
//! under a fresh random 12-byte nonce. The stored form is a single hex
//! string, `hex(nonce) ∥ hex(ciphertext ∥ tag)`, so the database column
//! stays plain text and the nonce travels with the record.
//!
//! The 256-bit key is SHA-256 of the operator-configured passphrase,
//! set once at startup and shared read-only for the process lifetime.

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Key, Nonce,
};
use sha2::{Digest, Sha256};

use crate::{CryptoError, Result};

/// Nonce size for ChaCha20-Poly1305 (96 bits = 12 bytes).
pub const NONCE_SIZE: usize = 12;

/// Key size (256 bits = 32 bytes).
pub const KEY_SIZE: usize = 32;

/// Hex characters occupied by the nonce prefix in the stored string.
pub const NONCE_HEX_LEN: usize = NONCE_SIZE * 2;

/// Seals and opens message bodies under a passphrase-derived key.
#[derive(Clone)]
pub struct MessageCipher {
    key: [u8; KEY_SIZE],
}

impl MessageCipher {
    /// Derive the message key by hashing the configured passphrase.
    pub fn from_passphrase(passphrase: &str) -> Self {
        let digest = Sha256::digest(passphrase.as_bytes());
        let mut key = [0u8; KEY_SIZE];
        key.copy_from_slice(&digest);
        Self { key }
    }

    /// Encrypt a message body for storage.
    ///
    /// Generates a fresh random nonce, so sealing the same plaintext
    /// twice yields different stored strings.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::Aead`] if encryption fails.
    pub fn seal(&self, plaintext: &str) -> Result<String> {
        let cipher = ChaCha20Poly1305::new(Key::from_slice(&self.key));

        let mut nonce = [0u8; NONCE_SIZE];
        rand::RngCore::fill_bytes(&mut rand::rngs::OsRng, &mut nonce);

        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext.as_bytes())
            .map_err(|_| CryptoError::Aead)?;

        let mut stored = String::with_capacity(NONCE_HEX_LEN + ciphertext.len() * 2);
        stored.push_str(&hex::encode(nonce));
        stored.push_str(&hex::encode(ciphertext));
        Ok(stored)
    }

    /// Decrypt a stored message body.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::Malformed`] if the stored string is not
    /// hex or is too short, and [`CryptoError::Aead`] if the
    /// authentication tag does not verify (tampering or key mismatch).
    pub fn open(&self, stored: &str) -> Result<String> {
        if stored.len() < NONCE_HEX_LEN {
            return Err(CryptoError::Malformed(format!(
                "stored ciphertext too short: {} chars",
                stored.len()
            )));
        }
        let (nonce_hex, ct_hex) = stored.split_at(NONCE_HEX_LEN);

        let nonce = hex::decode(nonce_hex)
            .map_err(|e| CryptoError::Malformed(format!("bad nonce hex: {e}")))?;
        let ciphertext = hex::decode(ct_hex)
            .map_err(|e| CryptoError::Malformed(format!("bad ciphertext hex: {e}")))?;

        let cipher = ChaCha20Poly1305::new(Key::from_slice(&self.key));
        let plaintext = cipher
            .decrypt(Nonce::from_slice(&nonce), ciphertext.as_slice())
            .map_err(|_| CryptoError::Aead)?;

        Ok(String::from_utf8_lossy(&plaintext).into_owned())
    }
}
