/// Blob Storage System
///
/// Handles the bytes of every photo: originals, thumbnails and description
/// sidecars. Supports multiple backend implementations (disk, S3).

pub mod disk;
pub mod imaging;
pub mod layout;
#[cfg(feature = "s3")]
pub mod s3;
pub mod store;

pub use layout::{content_type_for_path, StorageLayout};
pub use store::BlobStore;

use crate::{
    config::BlobstoreConfig,
    error::{JournalError, JournalResult},
};
use async_trait::async_trait;
use std::sync::Arc;

/// Location prefix recorded for blobs held in remote object storage
pub const CLOUD_SCHEME: &str = "cloud://";

/// Blob storage backend trait
///
/// Implementations handle the actual storage and retrieval of blob data,
/// addressed by `/`-separated keys.
#[async_trait]
pub trait BlobBackend: Send + Sync {
    /// Store a blob, creating any containers it needs
    async fn put(&self, key: &str, data: Vec<u8>, mime_type: &str) -> JournalResult<()>;

    /// Retrieve a blob by key
    async fn get(&self, key: &str) -> JournalResult<Option<Vec<u8>>>;

    /// Delete a blob by key; a missing blob is not an error
    async fn delete(&self, key: &str) -> JournalResult<()>;

    /// Verify the backend is reachable
    async fn check(&self) -> JournalResult<()>;

    /// Location string recorded in photo metadata for a key
    fn location(&self, key: &str) -> String {
        key.to_string()
    }

    /// Short backend name for logs and health output
    fn kind(&self) -> &'static str;
}

/// Build the backend selected by configuration
pub async fn backend_from_config(config: &BlobstoreConfig) -> JournalResult<Arc<dyn BlobBackend>> {
    match config {
        BlobstoreConfig::Disk { root } => {
            tracing::info!("Using disk blob storage at {}", root.display());
            Ok(Arc::new(disk::DiskBlobBackend::new(root.clone())))
        }
        #[cfg(feature = "s3")]
        BlobstoreConfig::S3 {
            bucket,
            region,
            access_key_id,
            secret_access_key,
            endpoint,
            prefix,
        } => {
            let backend = s3::S3BlobBackend::new(s3::S3Config {
                bucket: bucket.clone(),
                region: region.clone(),
                endpoint: endpoint.clone(),
                access_key_id: access_key_id.clone(),
                secret_access_key: secret_access_key.clone(),
                prefix: prefix.clone(),
            })
            .await?;
            Ok(Arc::new(backend))
        }
        #[cfg(not(feature = "s3"))]
        BlobstoreConfig::S3 { .. } => Err(JournalError::Config(
            "S3 blob storage requested but this build lacks the 's3' feature".to_string(),
        )),
    }
}
