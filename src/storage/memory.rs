//! In-process storage backend
//!
//! Holds both tables in memory. `set_unavailable` makes every operation fail,
//! which stands in for quota or disabled-storage conditions.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::backend::StorageBackend;
use super::error::StoreError;
use super::session::SessionRecord;

#[derive(Debug, Default)]
struct Tables {
    sessions: HashMap<String, SessionRecord>,
    key: Option<Vec<u8>>,
}

#[derive(Debug, Default)]
pub struct MemoryBackend {
    tables: Mutex<Tables>,
    unavailable: AtomicBool,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent operation fail (or succeed again)
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("storage disabled".to_string()));
        }
        Ok(self.tables.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl StorageBackend for MemoryBackend {
    async fn put_session(&self, record: SessionRecord) -> Result<(), StoreError> {
        self.tables()?.sessions.insert(record.id.clone(), record);
        Ok(())
    }

    async fn get_session(&self, id: &str) -> Result<Option<SessionRecord>, StoreError> {
        Ok(self.tables()?.sessions.get(id).cloned())
    }

    async fn list_sessions(&self) -> Result<Vec<SessionRecord>, StoreError> {
        Ok(self.tables()?.sessions.values().cloned().collect())
    }

    async fn delete_session(&self, id: &str) -> Result<(), StoreError> {
        self.tables()?.sessions.remove(id);
        Ok(())
    }

    async fn clear_sessions(&self) -> Result<(), StoreError> {
        self.tables()?.sessions.clear();
        Ok(())
    }

    async fn load_key(&self) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.tables()?.key.clone())
    }

    async fn store_key(&self, raw: &[u8]) -> Result<(), StoreError> {
        self.tables()?.key = Some(raw.to_vec());
        Ok(())
    }

    async fn delete_key(&self) -> Result<(), StoreError> {
        self.tables()?.key = None;
        Ok(())
    }
}
