//! Archive delivery
//!
//! Hands the archive to a native share target when one can take files,
//! otherwise writes it into the download directory.

use std::path::{Path, PathBuf};

use tokio::fs;

use super::archive::ExportArchive;
use super::ExportError;

/// A platform share mechanism
pub trait ShareTarget: Send + Sync {
    /// Whether file-like payloads can be shared
    fn can_share_files(&self) -> bool;

    fn share(&self, archive: &ExportArchive) -> Result<(), ExportError>;
}

/// How an archive reached the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Shared,
    Downloaded(PathBuf),
}

pub async fn deliver(
    archive: &ExportArchive,
    share: Option<&dyn ShareTarget>,
    download_dir: &Path,
) -> Result<Delivery, ExportError> {
    if let Some(target) = share.filter(|t| t.can_share_files()) {
        target.share(archive)?;
        return Ok(Delivery::Shared);
    }

    fs::create_dir_all(download_dir).await?;
    let path = download_dir.join(&archive.file_name);
    fs::write(&path, &archive.bytes).await?;
    tracing::info!("Log archive written to {}", path.display());
    Ok(Delivery::Downloaded(path))
}
