//! The user-supplied candidate file.

use anyhow::{Result, anyhow};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// A file picked or dropped by the user, awaiting validation/transmission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingFile {
    /// Identity of this selection; results are correlated by it.
    pub id: Uuid,
    /// Where the bytes are read from at transmit time.
    pub path: PathBuf,
    /// Declared size in bytes, taken from file metadata.
    pub size: u64,
    /// Display name (last path component).
    pub name: String,
}

impl PendingFile {
    /// Build a pending file with a fresh identity.
    pub fn new(path: PathBuf, size: u64, name: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            path,
            size,
            name,
        }
    }

    /// Stat a path on disk and wrap it. Directories and missing paths fail.
    pub fn from_path(path: &Path) -> Result<Self> {
        let meta = std::fs::metadata(path)
            .map_err(|e| anyhow!("cannot read {}: {e}", path.display()))?;
        if !meta.is_file() {
            return Err(anyhow!("{} is not a regular file", path.display()));
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(path.to_path_buf(), meta.len(), name))
    }
}
