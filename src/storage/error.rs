//! Storage error taxonomy

use std::io;

use thiserror::Error;

/// Categories of storage I/O failures for user-friendly messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageFailure {
    /// Disk is full or quota exceeded
    QuotaExceeded,
    /// Permission denied (read or write)
    PermissionDenied,
    /// File or directory not found
    NotFound,
    /// Other IO error
    Other,
}

impl StorageFailure {
    /// Get a user-friendly message for this failure
    pub fn user_message(&self) -> &'static str {
        match self {
            StorageFailure::QuotaExceeded => "storage quota exceeded",
            StorageFailure::PermissionDenied => "permission denied",
            StorageFailure::NotFound => "file or directory not found",
            StorageFailure::Other => "storage operation failed",
        }
    }
}

/// Categorize an IO error
pub fn categorize_io_error(e: &io::Error) -> StorageFailure {
    use std::io::ErrorKind;

    match e.kind() {
        ErrorKind::StorageFull | ErrorKind::WriteZero => StorageFailure::QuotaExceeded,
        ErrorKind::PermissionDenied => StorageFailure::PermissionDenied,
        ErrorKind::NotFound => StorageFailure::NotFound,
        _ => {
            #[cfg(unix)]
            {
                if let Some(os_error) = e.raw_os_error() {
                    // ENOSPC = 28; EDQUOT = 122 on Linux, 69 on macOS
                    if os_error == 28 || os_error == 122 || os_error == 69 {
                        return StorageFailure::QuotaExceeded;
                    }
                    // EACCES
                    if os_error == 13 {
                        return StorageFailure::PermissionDenied;
                    }
                }
            }
            StorageFailure::Other
        }
    }
}

/// Broad classes of store errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
    /// Quota, permission or availability problems of the durable store
    Transient,
    /// Ciphertext could not be decrypted under the current key
    Decryption,
    /// A record could not be encoded or decoded
    Serialization,
    /// The operation does not apply to the current session state
    State,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O failed ({}): {source}", categorize_io_error(.source).user_message())]
    Io {
        #[from]
        source: io::Error,
    },

    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("record encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("stored encryption key is malformed")]
    InvalidKey,

    #[error("encryption failed")]
    Encrypt,

    #[error("failed to decrypt session {session_id}")]
    Decrypt { session_id: String },

    #[error("invalid session id: {0}")]
    InvalidSessionId(String),

    #[error("no active session")]
    NoActiveSession,
}

impl StoreError {
    pub fn kind(&self) -> StoreErrorKind {
        match self {
            StoreError::Io { .. } | StoreError::Unavailable(_) => StoreErrorKind::Transient,
            StoreError::InvalidKey | StoreError::Encrypt | StoreError::Decrypt { .. } => {
                StoreErrorKind::Decryption
            }
            StoreError::Encoding(_) => StoreErrorKind::Serialization,
            StoreError::InvalidSessionId(_) | StoreError::NoActiveSession => StoreErrorKind::State,
        }
    }

    pub fn is_transient(&self) -> bool {
        self.kind() == StoreErrorKind::Transient
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categorize_io_error() {
        let denied = io::Error::new(io::ErrorKind::PermissionDenied, "nope");
        assert_eq!(categorize_io_error(&denied), StorageFailure::PermissionDenied);

        let missing = io::Error::new(io::ErrorKind::NotFound, "gone");
        assert_eq!(categorize_io_error(&missing), StorageFailure::NotFound);

        let other = io::Error::new(io::ErrorKind::Other, "weird");
        assert_eq!(categorize_io_error(&other), StorageFailure::Other);
    }

    #[cfg(unix)]
    #[test]
    fn test_categorize_raw_os_errors() {
        assert_eq!(
            categorize_io_error(&io::Error::from_raw_os_error(28)),
            StorageFailure::QuotaExceeded
        );
        assert_eq!(
            categorize_io_error(&io::Error::from_raw_os_error(13)),
            StorageFailure::PermissionDenied
        );
    }

    #[test]
    fn test_error_kinds() {
        let io_err: StoreError = io::Error::new(io::ErrorKind::Other, "x").into();
        assert!(io_err.is_transient());
        assert_eq!(
            StoreError::Decrypt {
                session_id: "s".into()
            }
            .kind(),
            StoreErrorKind::Decryption
        );
        assert_eq!(StoreError::NoActiveSession.kind(), StoreErrorKind::State);
    }

    #[test]
    fn test_io_error_message_includes_category() {
        let err: StoreError = io::Error::new(io::ErrorKind::PermissionDenied, "denied").into();
        assert!(err.to_string().contains("permission denied"));
    }
}
