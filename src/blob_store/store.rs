/// Blob Store Manager
///
/// Wraps the configured backend with the photo key layout, thumbnail
/// settings and best-effort cleanup
use crate::{
    blob_store::{layout::sidecar_key_for, BlobBackend, StorageLayout, CLOUD_SCHEME},
    config::ThumbnailConfig,
    error::JournalResult,
    metrics,
};
use std::sync::Arc;

/// Content type for generated thumbnails
pub const THUMBNAIL_MIME_TYPE: &str = "image/jpeg";

/// Main blob store manager
#[derive(Clone)]
pub struct BlobStore {
    backend: Arc<dyn BlobBackend>,
    layout: StorageLayout,
    thumbnails: ThumbnailConfig,
    write_sidecars: bool,
}

impl BlobStore {
    /// Create a new blob store
    pub fn new(
        backend: Arc<dyn BlobBackend>,
        layout: StorageLayout,
        thumbnails: ThumbnailConfig,
        write_sidecars: bool,
    ) -> Self {
        Self {
            backend,
            layout,
            thumbnails,
            write_sidecars,
        }
    }

    pub fn layout(&self) -> &StorageLayout {
        &self.layout
    }

    pub fn thumbnail_options(&self) -> &ThumbnailConfig {
        &self.thumbnails
    }

    pub fn backend_kind(&self) -> &'static str {
        self.backend.kind()
    }

    /// Verify the backend is reachable
    pub async fn check(&self) -> JournalResult<()> {
        self.backend.check().await
    }

    /// Write bytes under `key`; returns the location to record
    pub async fn put(&self, key: &str, data: Vec<u8>, mime_type: &str) -> JournalResult<String> {
        let len = data.len();
        self.backend.put(key, data, mime_type).await?;
        metrics::record_blob_bytes(len);

        tracing::debug!(key, bytes = len, backend = self.backend.kind(), "blob_stored");
        Ok(self.backend.location(key))
    }

    /// Write a description sidecar next to an original
    ///
    /// Returns `None` when sidecars are disabled.
    pub async fn put_sidecar(
        &self,
        sidecar_key: &str,
        description: &str,
    ) -> JournalResult<Option<String>> {
        if !self.write_sidecars {
            return Ok(None);
        }

        let location = self
            .put(sidecar_key, description.as_bytes().to_vec(), "text/plain; charset=utf-8")
            .await?;
        Ok(Some(location))
    }

    /// Read the blob recorded at `location`
    pub async fn read(&self, location: &str) -> JournalResult<Option<Vec<u8>>> {
        self.backend.get(Self::key_from_location(location)).await
    }

    /// Delete the blob at `location`, logging instead of failing
    ///
    /// Returns whether the delete call succeeded (a blob that was already
    /// missing counts as success).
    pub async fn remove_quietly(&self, location: &str) -> bool {
        let key = Self::key_from_location(location);
        match self.backend.delete(key).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(key, error = %e, "Failed to delete blob");
                false
            }
        }
    }

    /// Delete an original together with its thumbnail and sidecar
    ///
    /// Each removal is attempted independently; returns how many failed.
    pub async fn remove_photo_blobs(&self, file_path: &str, thumbnail_path: Option<&str>) -> usize {
        let sidecar = sidecar_key_for(Self::key_from_location(file_path));

        let mut failures = 0;
        if !self.remove_quietly(file_path).await {
            failures += 1;
        }
        if let Some(thumbnail) = thumbnail_path {
            if !self.remove_quietly(thumbnail).await {
                failures += 1;
            }
        }
        if !self.remove_quietly(&sidecar).await {
            failures += 1;
        }
        failures
    }

    /// Backend key for a recorded location
    pub fn key_from_location(location: &str) -> &str {
        location.strip_prefix(CLOUD_SCHEME).unwrap_or(location)
    }
}
