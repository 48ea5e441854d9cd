//! Durable storage interface
//!
//! Two tables: `sessions`, keyed by session id, and `encryption`, holding a
//! single raw key record. Every operation is asynchronous and may fail.

use std::future::Future;

use super::error::StoreError;
use super::session::SessionRecord;

pub trait StorageBackend: Send + Sync + 'static {
    /// Insert or fully replace a session record
    fn put_session(
        &self,
        record: SessionRecord,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn get_session(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<Option<SessionRecord>, StoreError>> + Send;

    /// Every stored session, in no particular order
    fn list_sessions(&self) -> impl Future<Output = Result<Vec<SessionRecord>, StoreError>> + Send;

    /// Delete a session; deleting a missing id is not an error
    fn delete_session(&self, id: &str) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn clear_sessions(&self) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Raw bytes of the persisted key, if one exists
    fn load_key(&self) -> impl Future<Output = Result<Option<Vec<u8>>, StoreError>> + Send;

    fn store_key(&self, raw: &[u8]) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn delete_key(&self) -> impl Future<Output = Result<(), StoreError>> + Send;
}
