//! Log export
//!
//! Builds a single zip archive of every session and delivers it to the user.

mod archive;
mod delivery;

pub use archive::{archive_file_name, build_archive, entry_name, ExportArchive, Exporter};
pub use delivery::{deliver, Delivery, ShareTarget};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to build archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("failed to write archive: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to share archive: {0}")]
    Share(String),
}
