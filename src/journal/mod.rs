/// Photo journal service
///
/// Orchestrates the metadata store and the blob store for every operation
/// the HTTP layer exposes. Handlers stay thin and only translate requests
/// and responses.

pub mod dates;
pub mod upload;

pub use upload::UploadRequest;

use crate::{
    blob_store::{content_type_for_path, imaging, BlobStore},
    error::{JournalError, JournalResult},
    metrics,
    photo_store::{Photo, PhotoFilter, PhotoStore},
};
use std::sync::Arc;

/// Which stored rendition of a photo to open
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageVariant {
    Original,
    Thumbnail,
}

/// Bytes resolved for a photo, ready to serve
#[derive(Debug)]
pub struct StoredImage {
    pub photo: Photo,
    pub data: Vec<u8>,
    pub content_type: &'static str,
    /// The blob was missing and `data` is a generated stand-in
    pub placeholder: bool,
}

/// The photo journal service
#[derive(Clone)]
pub struct PhotoJournal {
    photos: Arc<dyn PhotoStore>,
    blobs: BlobStore,
}

impl PhotoJournal {
    pub fn new(photos: Arc<dyn PhotoStore>, blobs: BlobStore) -> Self {
        Self { photos, blobs }
    }

    pub fn photo_store(&self) -> &Arc<dyn PhotoStore> {
        &self.photos
    }

    pub fn blob_store(&self) -> &BlobStore {
        &self.blobs
    }

    /// All photos, newest first, narrowed by `filter`
    pub async fn list(&self, filter: &PhotoFilter) -> JournalResult<Vec<Photo>> {
        let photos = self.photos.list_all().await?;
        if filter.is_empty() {
            return Ok(photos);
        }
        Ok(photos.into_iter().filter(|p| filter.matches(p)).collect())
    }

    /// A single photo record
    pub async fn get(&self, id: &str) -> JournalResult<Photo> {
        self.photos
            .get_by_id(id)
            .await?
            .ok_or_else(|| JournalError::NotFound(format!("Photo not found: {}", id)))
    }

    /// Resolve the bytes of a photo
    ///
    /// A missing blob yields a placeholder in the format the path suggests.
    /// Thumbnail requests fall back to the original when no thumbnail was
    /// recorded.
    pub async fn open(&self, id: &str, variant: ImageVariant) -> JournalResult<StoredImage> {
        let photo = self.get(id).await?;

        let location = match variant {
            ImageVariant::Original => photo.file_path.clone(),
            ImageVariant::Thumbnail => photo
                .thumbnail_path
                .clone()
                .unwrap_or_else(|| photo.file_path.clone()),
        };
        let content_type = content_type_for_path(&location);

        match self.blobs.read(&location).await? {
            Some(data) => Ok(StoredImage {
                photo,
                data,
                content_type,
                placeholder: false,
            }),
            None => {
                tracing::warn!(id, location = %location, "Blob missing, serving placeholder");
                metrics::record_placeholder();
                let data = tokio::task::spawn_blocking(move || imaging::placeholder(content_type))
                    .await
                    .map_err(|e| JournalError::Internal(format!("Placeholder task failed: {}", e)))?;
                Ok(StoredImage {
                    photo,
                    data,
                    content_type,
                    placeholder: true,
                })
            }
        }
    }

    /// Delete a photo's blobs (best effort) and then its record
    ///
    /// Unknown ids are `NotFound`. Blob failures are logged and never keep
    /// the record alive.
    pub async fn delete(&self, id: &str) -> JournalResult<Photo> {
        let photo = self.get(id).await?;

        let failures = self
            .blobs
            .remove_photo_blobs(&photo.file_path, photo.thumbnail_path.as_deref())
            .await;
        if failures > 0 {
            tracing::warn!(id, failures, "Some blobs could not be removed");
        }

        if !self.photos.delete_by_id(id).await? {
            // Removed concurrently between lookup and delete
            tracing::debug!(id, "Photo record already gone");
        }

        metrics::record_delete();
        tracing::info!(id, file_path = %photo.file_path, "photo_deleted");

        Ok(photo)
    }
}
