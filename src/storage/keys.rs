//! Encryption key lifecycle
//!
//! One symmetric key per data directory: generated on first need, persisted
//! in the `encryption` table, loaded (never regenerated) afterwards and cached
//! for the rest of the process.

use std::sync::Arc;

use tokio::sync::Mutex;
use zeroize::Zeroizing;

use super::backend::StorageBackend;
use super::crypto::SessionCipher;
use super::error::StoreError;

#[derive(Debug)]
pub struct KeyManager<B> {
    backend: Arc<B>,
    cached: Mutex<Option<Arc<SessionCipher>>>,
}

impl<B: StorageBackend> KeyManager<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            cached: Mutex::new(None),
        }
    }

    /// Return the cached cipher, loading or creating the key on first use.
    ///
    /// A generated key is only cached once it has been persisted.
    pub async fn get_or_create_key(&self) -> Result<Arc<SessionCipher>, StoreError> {
        let mut cached = self.cached.lock().await;
        if let Some(cipher) = cached.as_ref() {
            return Ok(Arc::clone(cipher));
        }

        let cipher = match self.backend.load_key().await? {
            Some(raw) => {
                let raw = Zeroizing::new(raw);
                SessionCipher::from_raw(&raw)?
            }
            None => {
                let (cipher, raw) = SessionCipher::generate();
                self.backend.store_key(&raw).await?;
                tracing::info!("Generated new log encryption key");
                cipher
            }
        };

        let cipher = Arc::new(cipher);
        *cached = Some(Arc::clone(&cipher));
        Ok(cipher)
    }

    /// Delete the persisted key and drop the cached one.
    ///
    /// Every session encrypted under the old key becomes unreadable.
    pub async fn reset_key(&self) -> Result<(), StoreError> {
        let mut cached = self.cached.lock().await;
        self.backend.delete_key().await?;
        *cached = None;
        tracing::warn!("Log encryption key reset; existing sessions are no longer readable");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::crypto::generate_nonce;
    use crate::storage::memory::MemoryBackend;

    #[tokio::test]
    async fn test_creates_then_caches() {
        let backend = Arc::new(MemoryBackend::new());
        let keys = KeyManager::new(Arc::clone(&backend));

        let first = keys.get_or_create_key().await.unwrap();
        assert!(backend.load_key().await.unwrap().is_some());

        let second = keys.get_or_create_key().await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_reloads_persisted_key_across_instances() {
        let backend = Arc::new(MemoryBackend::new());
        let nonce = generate_nonce();

        let ciphertext = {
            let keys = KeyManager::new(Arc::clone(&backend));
            let cipher = keys.get_or_create_key().await.unwrap();
            cipher.encrypt(&nonce, b"before restart").unwrap()
        };

        let keys = KeyManager::new(Arc::clone(&backend));
        let cipher = keys.get_or_create_key().await.unwrap();
        assert_eq!(cipher.decrypt("s", &nonce, &ciphertext).unwrap(), b"before restart");
    }

    #[tokio::test]
    async fn test_reset_invalidates_old_ciphertext() {
        let backend = Arc::new(MemoryBackend::new());
        let keys = KeyManager::new(Arc::clone(&backend));
        let nonce = generate_nonce();

        let old = keys.get_or_create_key().await.unwrap();
        let ciphertext = old.encrypt(&nonce, b"old").unwrap();

        keys.reset_key().await.unwrap();
        assert!(backend.load_key().await.unwrap().is_none());

        let new = keys.get_or_create_key().await.unwrap();
        assert!(new.decrypt("s", &nonce, &ciphertext).is_err());
    }

    #[tokio::test]
    async fn test_failed_persist_is_not_cached() {
        let backend = Arc::new(MemoryBackend::new());
        let keys = KeyManager::new(Arc::clone(&backend));

        backend.set_unavailable(true);
        assert!(keys.get_or_create_key().await.is_err());

        backend.set_unavailable(false);
        keys.get_or_create_key().await.unwrap();
        assert!(backend.load_key().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_malformed_persisted_key() {
        let backend = Arc::new(MemoryBackend::new());
        backend.store_key(&[1, 2, 3]).await.unwrap();

        let keys = KeyManager::new(backend);
        assert!(matches!(
            keys.get_or_create_key().await,
            Err(StoreError::InvalidKey)
        ));
    }
}
