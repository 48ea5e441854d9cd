//! Session records
//!
//! `SessionRecord` is the stored shape (ciphertext); `LogSession` is what
//! reads hand back after decryption.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::crypto::NONCE_LEN;

/// A stored, encrypted session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub id: String,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    pub encrypted_logs: Vec<u8>,
    pub iv: [u8; NONCE_LEN],
}

impl SessionRecord {
    /// A fresh record with no ciphertext yet
    pub fn placeholder(id: String, started_at: DateTime<Utc>, iv: [u8; NONCE_LEN]) -> Self {
        Self {
            id,
            started_at,
            ended_at: None,
            encrypted_logs: Vec::new(),
            iv,
        }
    }
}

/// A decrypted session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSession {
    pub id: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub logs: String,
}

impl LogSession {
    /// Whether the session has not been closed
    pub fn is_open(&self) -> bool {
        self.ended_at.is_none()
    }
}

/// Mint a session id from the start time plus random bits
pub fn new_session_id(started_at: DateTime<Utc>) -> String {
    let random = Uuid::new_v4().simple().to_string();
    format!("session_{}_{}", started_at.timestamp_millis(), &random[..8])
}

/// Check that an id is safe to use as a storage key
pub fn is_valid_session_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 128
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
