//! Encrypted session storage
//!
//! Log sessions are persisted as independently encrypted records behind a
//! pluggable backend, with one symmetric key managed per data directory.

mod backend;
mod crypto;
mod error;
mod file;
mod keys;
mod memory;
mod session;
mod store;

pub use backend::StorageBackend;
pub use crypto::{generate_nonce, SessionCipher, KEY_LEN, NONCE_LEN};
pub use error::{categorize_io_error, StorageFailure, StoreError, StoreErrorKind};
pub use file::FileBackend;
pub use keys::KeyManager;
pub use memory::MemoryBackend;
pub use session::{is_valid_session_id, new_session_id, LogSession, SessionRecord};
pub use store::{NoncePolicy, SessionStore, MAX_SESSIONS};
