/// Disk-based blob storage backend
use crate::{
    blob_store::BlobBackend,
    error::{JournalError, JournalResult},
};
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tokio::fs;

/// Disk storage backend
///
/// Keys are `/`-separated paths relative to the storage root, e.g.
/// `2024/03/05/Site-1_<id>.jpg`. A key that would resolve outside the root
/// is rejected.
#[derive(Clone)]
pub struct DiskBlobBackend {
    base_path: PathBuf,
}

impl DiskBlobBackend {
    /// Create a new disk storage backend
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    /// Get the file path for a key
    fn get_blob_path(&self, key: &str) -> JournalResult<PathBuf> {
        let relative = Path::new(key);
        let mut components = relative.components().peekable();
        let plain = components.peek().is_some()
            && components.all(|c| matches!(c, Component::Normal(_)));

        if !plain {
            return Err(JournalError::Storage(format!(
                "Refusing blob key outside storage root: {}",
                key
            )));
        }

        Ok(self.base_path.join(relative))
    }

    /// Ensure the directory for a blob exists
    async fn ensure_blob_dir(&self, key: &str) -> JournalResult<PathBuf> {
        let blob_path = self.get_blob_path(key)?;
        if let Some(parent) = blob_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                JournalError::Storage(format!("Failed to create blob directory: {}", e))
            })?;
        }
        Ok(blob_path)
    }
}

#[async_trait]
impl BlobBackend for DiskBlobBackend {
    async fn put(&self, key: &str, data: Vec<u8>, _mime_type: &str) -> JournalResult<()> {
        let blob_path = self.ensure_blob_dir(key).await?;

        fs::write(&blob_path, data).await.map_err(|e| {
            JournalError::Storage(format!("Failed to write blob {}: {}", key, e))
        })?;

        Ok(())
    }

    async fn get(&self, key: &str) -> JournalResult<Option<Vec<u8>>> {
        let blob_path = self.get_blob_path(key)?;

        match fs::read(&blob_path).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(JournalError::Storage(format!(
                "Failed to read blob {}: {}",
                key, e
            ))),
        }
    }

    async fn delete(&self, key: &str) -> JournalResult<()> {
        let blob_path = self.get_blob_path(key)?;

        match fs::remove_file(&blob_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(JournalError::Storage(format!(
                "Failed to delete blob {}: {}",
                key, e
            ))),
        }
    }

    async fn check(&self) -> JournalResult<()> {
        fs::create_dir_all(&self.base_path).await.map_err(|e| {
            JournalError::Storage(format!(
                "Storage root {} unavailable: {}",
                self.base_path.display(),
                e
            ))
        })
    }

    fn kind(&self) -> &'static str {
        "disk"
    }
}
