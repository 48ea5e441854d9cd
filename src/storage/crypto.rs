//! AES-256-GCM session encryption

use std::fmt;

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Nonce};
use zeroize::Zeroizing;

use super::error::StoreError;

/// Nonce length in bytes
pub const NONCE_LEN: usize = 12;

/// Key length in bytes
pub const KEY_LEN: usize = 32;

/// Generate a random 12-byte nonce
pub fn generate_nonce() -> [u8; NONCE_LEN] {
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let mut out = [0u8; NONCE_LEN];
    out.copy_from_slice(&nonce);
    out
}

/// Symmetric cipher for session snapshots.
///
/// Holds the expanded key only; raw key bytes are handed out once, at
/// generation time, to the key manager.
#[derive(Clone)]
pub struct SessionCipher {
    cipher: Aes256Gcm,
}

impl SessionCipher {
    /// Generate a fresh key, returning the cipher and the raw bytes to persist
    pub(crate) fn generate() -> (Self, Zeroizing<Vec<u8>>) {
        let key = Aes256Gcm::generate_key(&mut OsRng);
        let raw = Zeroizing::new(key.to_vec());
        (
            Self {
                cipher: Aes256Gcm::new(&key),
            },
            raw,
        )
    }

    /// Rebuild a cipher from persisted raw bytes
    pub(crate) fn from_raw(raw: &[u8]) -> Result<Self, StoreError> {
        if raw.len() != KEY_LEN {
            return Err(StoreError::InvalidKey);
        }
        let cipher = Aes256Gcm::new_from_slice(raw).map_err(|_| StoreError::InvalidKey)?;
        Ok(Self { cipher })
    }

    pub fn encrypt(&self, nonce: &[u8; NONCE_LEN], plaintext: &[u8]) -> Result<Vec<u8>, StoreError> {
        self.cipher
            .encrypt(Nonce::from_slice(nonce), plaintext)
            .map_err(|_| StoreError::Encrypt)
    }

    pub fn decrypt(
        &self,
        session_id: &str,
        nonce: &[u8; NONCE_LEN],
        ciphertext: &[u8],
    ) -> Result<Vec<u8>, StoreError> {
        self.cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| StoreError::Decrypt {
                session_id: session_id.to_string(),
            })
    }
}

impl fmt::Debug for SessionCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCipher").finish_non_exhaustive()
    }
}
