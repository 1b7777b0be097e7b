//! On-disk storage for file bytes

use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

use crate::error::{DriveError, Result};

/// Name and location of bytes written by [`FileStore::write`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub name: String,
    pub location: String,
}

/// Keeps uploaded bytes under a single root directory as `<id>_<name>`.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write `bytes` for resource `id`. The original name is reduced to its
    /// final path component.
    pub async fn write(&self, id: &str, original_name: &str, bytes: &[u8]) -> Result<StoredFile> {
        let name = sanitize_file_name(original_name)
            .ok_or_else(|| DriveError::Conflict(format!("invalid file name: {:?}", original_name)))?;

        fs::create_dir_all(&self.root).await?;
        let path = self.root.join(format!("{}_{}", id, name));
        fs::write(&path, bytes).await?;
        debug!("Stored {} bytes at {}", bytes.len(), path.display());

        Ok(StoredFile {
            name,
            location: path.to_string_lossy().into_owned(),
        })
    }

    pub async fn read(&self, location: &str) -> Result<Vec<u8>> {
        let path = self.contained(location)?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(DriveError::NotFound(format!("file bytes at {}", location)))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Remove stored bytes. Already-missing bytes are not an error.
    pub async fn remove(&self, location: &str) -> Result<()> {
        let path = self.contained(location)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("File bytes already missing at {}", location);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    // Locations come from the store; anything outside the root is treated as absent
    fn contained(&self, location: &str) -> Result<PathBuf> {
        let path = PathBuf::from(location);
        let escapes = path
            .components()
            .any(|c| matches!(c, std::path::Component::ParentDir));
        if escapes || !path.starts_with(&self.root) {
            return Err(DriveError::NotFound(format!("file bytes at {}", location)));
        }
        Ok(path)
    }
}

/// Reduce an uploaded name to a bare file name, or `None` if nothing usable remains.
pub fn sanitize_file_name(name: &str) -> Option<String> {
    let last = name.rsplit(['/', '\\']).next().unwrap_or("").trim();
    match last {
        "" | "." | ".." => None,
        valid => Some(valid.to_string()),
    }
}
