/// Application context and dependency injection
use crate::{
    blob_store::{self, BlobStore, StorageLayout},
    config::{BlobstoreConfig, MetadataStoreConfig, ServerConfig},
    db,
    error::{JournalError, JournalResult},
    journal::PhotoJournal,
    photo_store::{MemoryPhotoStore, PhotoStore, SqlitePhotoStore},
};
use sqlx::SqlitePool;
use std::{sync::Arc, time::Instant};

/// Application context holding all shared services
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<ServerConfig>,
    pub journal: Arc<PhotoJournal>,
    /// Present when metadata lives in SQLite
    pub db: Option<SqlitePool>,
    pub started_at: Instant,
}

impl AppContext {
    /// Create a new application context from configuration
    pub async fn new(config: ServerConfig) -> JournalResult<Self> {
        config.validate()?;

        Self::ensure_directories(&config).await?;

        let (photos, pool): (Arc<dyn PhotoStore>, Option<SqlitePool>) =
            match &config.storage.metadata {
                MetadataStoreConfig::Sqlite { path } => {
                    let pool = db::create_pool(path, db::DatabaseOptions::default()).await?;
                    db::run_migrations(&pool).await?;
                    db::test_connection(&pool).await?;

                    tracing::info!("Using SQLite metadata store at {}", path.display());
                    (Arc::new(SqlitePhotoStore::new(pool.clone())), Some(pool))
                }
                MetadataStoreConfig::Memory => {
                    tracing::warn!(
                        "Using in-memory metadata store: photo records will be lost on restart"
                    );
                    (Arc::new(MemoryPhotoStore::new()), None)
                }
            };

        let backend = blob_store::backend_from_config(&config.storage.blobstore).await?;
        let blobs = BlobStore::new(
            backend,
            StorageLayout::new(&config.storage.thumbnail_subdir),
            config.thumbnails.clone(),
            config.storage.write_sidecars,
        );

        Ok(Self::from_parts(config, PhotoJournal::new(photos, blobs), pool))
    }

    /// Assemble a context from already-built services
    pub fn from_parts(config: ServerConfig, journal: PhotoJournal, db: Option<SqlitePool>) -> Self {
        Self {
            config: Arc::new(config),
            journal: Arc::new(journal),
            db,
            started_at: Instant::now(),
        }
    }

    /// Ensure required directories exist
    async fn ensure_directories(config: &ServerConfig) -> JournalResult<()> {
        let mut dirs = vec![&config.storage.data_directory];
        if let BlobstoreConfig::Disk { root } = &config.storage.blobstore {
            dirs.push(root);
        }

        for dir in dirs {
            tokio::fs::create_dir_all(dir).await.map_err(|e| {
                JournalError::Config(format!("Failed to create directory {:?}: {}", dir, e))
            })?;
        }

        Ok(())
    }

    /// Get service URL
    pub fn service_url(&self) -> String {
        format!(
            "http://{}:{}",
            self.config.service.hostname, self.config.service.port
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn config_for(vars: &[(&str, String)]) -> ServerConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned()).unwrap()
    }

    #[tokio::test]
    async fn test_sqlite_context_creates_directories_and_database() {
        let dir = tempdir().unwrap();
        let data = dir.path().join("data");
        let uploads = dir.path().join("uploads");

        let config = config_for(&[
            ("JOURNAL_DATA_DIRECTORY", data.display().to_string()),
            ("JOURNAL_STORAGE_ROOT", uploads.display().to_string()),
        ]);

        let ctx = AppContext::new(config).await.unwrap();

        assert!(ctx.db.is_some());
        assert!(data.join("photos.db").exists());
        assert!(uploads.is_dir());
        assert_eq!(ctx.journal.photo_store().kind(), "sqlite");
        assert_eq!(ctx.service_url(), "http://127.0.0.1:3000");
    }

    #[tokio::test]
    async fn test_memory_context_has_no_database() {
        let dir = tempdir().unwrap();
        let config = config_for(&[
            ("JOURNAL_DATA_DIRECTORY", dir.path().join("data").display().to_string()),
            ("JOURNAL_STORAGE_ROOT", dir.path().join("uploads").display().to_string()),
            ("JOURNAL_METADATA_STORE", "memory".to_string()),
        ]);

        let ctx = AppContext::new(config).await.unwrap();

        assert!(ctx.db.is_none());
        assert_eq!(ctx.journal.photo_store().kind(), "memory");
    }
}
