//! Secure session store
//!
//! Per session id the lifecycle is `NONE -> ACTIVE -> CLOSED`:
//!
//! - `start_session` prunes old sessions, mints an id and nonce, writes an
//!   empty placeholder and marks it current.
//! - `save_session_logs` re-encrypts the whole buffer text and overwrites the
//!   record (full snapshot, last write wins).
//! - `end_session` stamps `ended_at`; the record stays readable.
//!
//! Pruning only happens at session start: once the count reaches the cap,
//! the oldest sessions by `started_at` are deleted until `cap - 1` remain.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::backend::StorageBackend;
use super::crypto::{generate_nonce, SessionCipher, NONCE_LEN};
use super::error::StoreError;
use super::keys::KeyManager;
use super::session::{new_session_id, LogSession, SessionRecord};

/// Default number of sessions retained
pub const MAX_SESSIONS: usize = 10;

/// How nonces are chosen for session snapshots
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoncePolicy {
    /// One nonce per session, reused for every snapshot of that session
    #[default]
    Session,
    /// A fresh nonce for every snapshot, stored alongside it
    PerWrite,
}

#[derive(Debug, Clone)]
struct ActiveSession {
    id: String,
    started_at: DateTime<Utc>,
    iv: [u8; NONCE_LEN],
}

#[derive(Debug)]
pub struct SessionStore<B> {
    backend: Arc<B>,
    keys: KeyManager<B>,
    max_sessions: usize,
    nonce_policy: NoncePolicy,
    current: Mutex<Option<ActiveSession>>,
    last_started_at: Mutex<Option<DateTime<Utc>>>,
    // Serializes writes that target the current session
    write_gate: tokio::sync::Mutex<()>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<B: StorageBackend> SessionStore<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self::with_options(backend, MAX_SESSIONS, NoncePolicy::default())
    }

    pub fn with_options(backend: Arc<B>, max_sessions: usize, nonce_policy: NoncePolicy) -> Self {
        Self {
            keys: KeyManager::new(Arc::clone(&backend)),
            backend,
            max_sessions: max_sessions.max(1),
            nonce_policy,
            current: Mutex::new(None),
            last_started_at: Mutex::new(None),
            write_gate: tokio::sync::Mutex::new(()),
        }
    }

    pub fn max_sessions(&self) -> usize {
        self.max_sessions
    }

    pub fn nonce_policy(&self) -> NoncePolicy {
        self.nonce_policy
    }

    /// Id of the session currently being written, if any
    pub fn current_session_id(&self) -> Option<String> {
        lock(&self.current).as_ref().map(|s| s.id.clone())
    }

    /// Start a new current session and return its id.
    ///
    /// A session that is still current is closed first. The new session is
    /// current even if writing its placeholder fails; the error is returned
    /// and the next successful snapshot recreates the record.
    pub async fn start_session(&self) -> Result<String, StoreError> {
        let _gate = self.write_gate.lock().await;

        let previous = lock(&self.current).take();
        if let Some(previous) = previous {
            if let Err(e) = self.close_record(&previous).await {
                tracing::warn!("Failed to close session {}: {}", previous.id, e);
            }
        }

        match self.prune().await {
            Ok(0) => {}
            Ok(pruned) => tracing::debug!("Pruned {} old log sessions", pruned),
            Err(e) => tracing::warn!("Failed to prune old log sessions: {}", e),
        }

        let started_at = self.next_start_time();
        let active = ActiveSession {
            id: new_session_id(started_at),
            started_at,
            iv: generate_nonce(),
        };
        let id = active.id.clone();
        let record = SessionRecord::placeholder(id.clone(), started_at, active.iv);
        *lock(&self.current) = Some(active);

        self.backend.put_session(record).await?;
        tracing::debug!("Started log session {}", id);
        Ok(id)
    }

    /// Overwrite the current session with an encrypted snapshot of `logs`
    pub async fn save_session_logs(&self, logs: &str) -> Result<(), StoreError> {
        let _gate = self.write_gate.lock().await;

        let active = lock(&self.current)
            .clone()
            .ok_or(StoreError::NoActiveSession)?;
        let cipher = self.keys.get_or_create_key().await?;

        let iv = match self.nonce_policy {
            NoncePolicy::Session => active.iv,
            NoncePolicy::PerWrite => generate_nonce(),
        };
        let encrypted_logs = cipher.encrypt(&iv, logs.as_bytes())?;

        self.backend
            .put_session(SessionRecord {
                id: active.id,
                started_at: active.started_at,
                ended_at: None,
                encrypted_logs,
                iv,
            })
            .await
    }

    /// Close the current session. Calling it with no current session is a no-op.
    pub async fn end_session(&self) -> Result<(), StoreError> {
        let _gate = self.write_gate.lock().await;

        let active = lock(&self.current).take();
        match active {
            Some(active) => {
                self.close_record(&active).await?;
                tracing::debug!("Ended log session {}", active.id);
                Ok(())
            }
            None => Ok(()),
        }
    }

    /// Load and decrypt every session, oldest first.
    ///
    /// Sessions that fail to decrypt are skipped with a warning. A key that
    /// cannot be loaded only costs the sessions that hold ciphertext.
    pub async fn get_all_sessions(&self) -> Result<Vec<LogSession>, StoreError> {
        let mut records = self.backend.list_sessions().await?;
        sort_by_start(&mut records);

        let cipher = if records.iter().any(|r| !r.encrypted_logs.is_empty()) {
            match self.keys.get_or_create_key().await {
                Ok(cipher) => Some(cipher),
                Err(e) => {
                    tracing::warn!("Log encryption key unavailable: {}", e);
                    None
                }
            }
        } else {
            None
        };

        let sessions = records
            .into_iter()
            .filter_map(|record| match decrypt_record(cipher.as_deref(), &record) {
                Ok(logs) => Some(LogSession {
                    id: record.id,
                    started_at: record.started_at,
                    ended_at: record.ended_at,
                    logs,
                }),
                Err(e) => {
                    tracing::warn!("Skipping log session {}: {}", record.id, e);
                    None
                }
            })
            .collect();

        Ok(sessions)
    }

    /// Delete every session and forget the current one
    pub async fn clear_all_sessions(&self) -> Result<(), StoreError> {
        let _gate = self.write_gate.lock().await;
        *lock(&self.current) = None;
        self.backend.clear_sessions().await
    }

    pub async fn session_count(&self) -> Result<usize, StoreError> {
        Ok(self.backend.list_sessions().await?.len())
    }

    /// Delete the encryption key; stored sessions become unreadable
    pub async fn reset_key(&self) -> Result<(), StoreError> {
        self.keys.reset_key().await
    }

    async fn close_record(&self, active: &ActiveSession) -> Result<(), StoreError> {
        let mut record = self
            .backend
            .get_session(&active.id)
            .await?
            .unwrap_or_else(|| {
                SessionRecord::placeholder(active.id.clone(), active.started_at, active.iv)
            });
        record.ended_at = Some(Utc::now());
        self.backend.put_session(record).await
    }

    async fn prune(&self) -> Result<usize, StoreError> {
        let mut records = self.backend.list_sessions().await?;
        if records.len() < self.max_sessions {
            return Ok(0);
        }

        sort_by_start(&mut records);
        let excess = records.len() - (self.max_sessions - 1);
        for record in records.iter().take(excess) {
            self.backend.delete_session(&record.id).await?;
        }
        Ok(excess)
    }

    // Strictly increasing within the process so start order is unambiguous
    fn next_start_time(&self) -> DateTime<Utc> {
        let mut last = lock(&self.last_started_at);
        let mut now = Utc::now();
        if let Some(previous) = *last {
            if now <= previous {
                now = previous + Duration::microseconds(1);
            }
        }
        *last = Some(now);
        now
    }
}

fn sort_by_start(records: &mut [SessionRecord]) {
    records.sort_by(|a, b| {
        a.started_at
            .cmp(&b.started_at)
            .then_with(|| a.id.cmp(&b.id))
    });
}

fn decrypt_record(
    cipher: Option<&SessionCipher>,
    record: &SessionRecord,
) -> Result<String, StoreError> {
    if record.encrypted_logs.is_empty() {
        return Ok(String::new());
    }
    let decrypt_error = || StoreError::Decrypt {
        session_id: record.id.clone(),
    };
    let cipher = cipher.ok_or_else(decrypt_error)?;
    let plaintext = cipher.decrypt(&record.id, &record.iv, &record.encrypted_logs)?;
    String::from_utf8(plaintext).map_err(|_| decrypt_error())
}
