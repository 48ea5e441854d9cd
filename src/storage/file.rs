//! On-disk storage backend
//!
//! Layout under the data directory:
//!
//! ```text
//! sessions/<id>.json     one SessionRecord per file
//! encryption/key.json    the single raw key record
//! ```
//!
//! Writes land in a `.tmp` sibling first and are renamed into place, so an
//! interrupted write leaves the previous record intact.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::fs;
use zeroize::Zeroize;

use super::backend::StorageBackend;
use super::error::StoreError;
use super::session::{is_valid_session_id, SessionRecord};

const SESSIONS_DIR: &str = "sessions";
const ENCRYPTION_DIR: &str = "encryption";
const KEY_FILE: &str = "key.json";
const KEY_RECORD_ID: &str = "master";

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KeyRecord {
    id: String,
    raw_key: Vec<u8>,
}

impl Drop for KeyRecord {
    fn drop(&mut self) {
        self.raw_key.zeroize();
    }
}

/// Storage backend persisting both tables as JSON files
#[derive(Debug, Clone)]
pub struct FileBackend {
    root: PathBuf,
}

impl FileBackend {
    /// Open (creating if needed) the store rooted at `root`.
    ///
    /// This is the one storage failure that propagates to the caller.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(root.join(SESSIONS_DIR)).await?;
        fs::create_dir_all(root.join(ENCRYPTION_DIR)).await?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn sessions_dir(&self) -> PathBuf {
        self.root.join(SESSIONS_DIR)
    }

    fn key_path(&self) -> PathBuf {
        self.root.join(ENCRYPTION_DIR).join(KEY_FILE)
    }

    fn session_path(&self, id: &str) -> Result<PathBuf, StoreError> {
        if !is_valid_session_id(id) {
            return Err(StoreError::InvalidSessionId(id.to_string()));
        }
        Ok(self.sessions_dir().join(format!("{}.json", id)))
    }

    async fn read_record(path: &Path) -> Result<Option<SessionRecord>, StoreError> {
        match fs::read(path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, bytes).await?;
    restrict_permissions(&tmp).await?;
    fs::rename(&tmp, path).await?;
    Ok(())
}

#[cfg(unix)]
async fn restrict_permissions(path: &Path) -> Result<(), StoreError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).await?;
    Ok(())
}

#[cfg(not(unix))]
async fn restrict_permissions(_path: &Path) -> Result<(), StoreError> {
    Ok(())
}

async fn remove_if_exists(path: &Path) -> Result<(), StoreError> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

impl StorageBackend for FileBackend {
    async fn put_session(&self, record: SessionRecord) -> Result<(), StoreError> {
        let path = self.session_path(&record.id)?;
        let bytes = serde_json::to_vec(&record)?;
        write_atomic(&path, &bytes).await
    }

    async fn get_session(&self, id: &str) -> Result<Option<SessionRecord>, StoreError> {
        let path = self.session_path(id)?;
        Self::read_record(&path).await
    }

    async fn list_sessions(&self) -> Result<Vec<SessionRecord>, StoreError> {
        let mut records = Vec::new();
        let mut entries = fs::read_dir(self.sessions_dir()).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match Self::read_record(&path).await {
                Ok(Some(record)) => records.push(record),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!("Skipping unreadable session record {}: {}", path.display(), e);
                }
            }
        }

        Ok(records)
    }

    async fn delete_session(&self, id: &str) -> Result<(), StoreError> {
        let path = self.session_path(id)?;
        remove_if_exists(&path).await
    }

    async fn clear_sessions(&self) -> Result<(), StoreError> {
        let mut entries = fs::read_dir(self.sessions_dir()).await?;
        while let Some(entry) = entries.next_entry().await? {
            remove_if_exists(&entry.path()).await?;
        }
        Ok(())
    }

    async fn load_key(&self) -> Result<Option<Vec<u8>>, StoreError> {
        match fs::read(self.key_path()).await {
            Ok(mut bytes) => {
                let parsed = serde_json::from_slice::<KeyRecord>(&bytes);
                bytes.zeroize();
                let record = parsed?;
                Ok(Some(record.raw_key.clone()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn store_key(&self, raw: &[u8]) -> Result<(), StoreError> {
        let record = KeyRecord {
            id: KEY_RECORD_ID.to_string(),
            raw_key: raw.to_vec(),
        };
        let mut bytes = serde_json::to_vec(&record)?;
        let result = write_atomic(&self.key_path(), &bytes).await;
        bytes.zeroize();
        result
    }

    async fn delete_key(&self) -> Result<(), StoreError> {
        remove_if_exists(&self.key_path()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::TempDir;

    async fn test_backend(temp_dir: &TempDir) -> FileBackend {
        FileBackend::open(temp_dir.path().join("data")).await.unwrap()
    }

    #[tokio::test]
    async fn test_open_creates_tables() {
        let temp_dir = TempDir::new().unwrap();
        let backend = test_backend(&temp_dir).await;
        assert!(backend.root().join(SESSIONS_DIR).is_dir());
        assert!(backend.root().join(ENCRYPTION_DIR).is_dir());
    }

    #[tokio::test]
    async fn test_open_fails_on_unusable_root() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("file");
        std::fs::write(&blocker, b"not a dir").unwrap();

        assert!(FileBackend::open(blocker.join("data")).await.is_err());
    }

    #[tokio::test]
    async fn test_session_roundtrip_and_overwrite() {
        let temp_dir = TempDir::new().unwrap();
        let backend = test_backend(&temp_dir).await;

        let mut record = SessionRecord::placeholder("session_1_ab".into(), Utc::now(), [3; 12]);
        backend.put_session(record.clone()).await.unwrap();

        record.encrypted_logs = vec![1, 2, 3];
        backend.put_session(record.clone()).await.unwrap();

        let loaded = backend.get_session("session_1_ab").await.unwrap();
        assert_eq!(loaded, Some(record));
        assert_eq!(backend.list_sessions().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_session_is_none() {
        let temp_dir = TempDir::new().unwrap();
        let backend = test_backend(&temp_dir).await;
        assert!(backend.get_session("session_x").await.unwrap().is_none());
        backend.delete_session("session_x").await.unwrap();
    }

    #[tokio::test]
    async fn test_rejects_path_like_ids() {
        let temp_dir = TempDir::new().unwrap();
        let backend = test_backend(&temp_dir).await;
        let result = backend.get_session("../encryption/key").await;
        assert!(matches!(result, Err(StoreError::InvalidSessionId(_))));
    }

    #[tokio::test]
    async fn test_list_skips_corrupted_files() {
        let temp_dir = TempDir::new().unwrap();
        let backend = test_backend(&temp_dir).await;

        let record = SessionRecord::placeholder("session_ok".into(), Utc::now(), [0; 12]);
        backend.put_session(record).await.unwrap();
        std::fs::write(backend.sessions_dir().join("session_bad.json"), b"{ nope").unwrap();

        let records = backend.list_sessions().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "session_ok");
    }

    #[tokio::test]
    async fn test_clear_sessions() {
        let temp_dir = TempDir::new().unwrap();
        let backend = test_backend(&temp_dir).await;
        for id in ["session_a", "session_b"] {
            let record = SessionRecord::placeholder(id.into(), Utc::now(), [0; 12]);
            backend.put_session(record).await.unwrap();
        }

        backend.clear_sessions().await.unwrap();
        assert!(backend.list_sessions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_key_table() {
        let temp_dir = TempDir::new().unwrap();
        let backend = test_backend(&temp_dir).await;

        assert!(backend.load_key().await.unwrap().is_none());
        backend.store_key(&[9; 32]).await.unwrap();
        assert_eq!(backend.load_key().await.unwrap(), Some(vec![9; 32]));

        backend.delete_key().await.unwrap();
        assert!(backend.load_key().await.unwrap().is_none());
        backend.delete_key().await.unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_key_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let backend = test_backend(&temp_dir).await;
        backend.store_key(&[1; 32]).await.unwrap();

        let mode = std::fs::metadata(backend.key_path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
