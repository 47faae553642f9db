/// Configuration management for the photo journal
use crate::error::{JournalError, JournalResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Component, Path, PathBuf};

/// Filter used when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "photo_journal=debug,tower_http=debug";

/// Main server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub service: ServiceConfig,
    pub storage: StorageConfig,
    pub thumbnails: ThumbnailConfig,
    pub logging: LoggingConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub hostname: String,
    pub port: u16,
    /// Maximum accepted request body for uploads, in bytes
    pub upload_limit: usize,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_directory: PathBuf,
    pub metadata: MetadataStoreConfig,
    pub blobstore: BlobstoreConfig,
    /// Thumbnail folder, relative to the blob root
    pub thumbnail_subdir: String,
    /// Write a `.txt` description sidecar next to each original
    pub write_sidecars: bool,
}

/// Metadata store selection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MetadataStoreConfig {
    Sqlite { path: PathBuf },
    /// Process-lifetime only; everything is lost on restart
    Memory,
}

/// Blob storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BlobstoreConfig {
    Disk {
        root: PathBuf,
    },
    S3 {
        bucket: String,
        region: String,
        access_key_id: String,
        secret_access_key: String,
        endpoint: Option<String>,
        prefix: String,
    },
}

/// Thumbnail generation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThumbnailConfig {
    /// Bounding box, in pixels, on both sides
    pub max_size: u32,
    /// JPEG quality (1-100)
    pub quality: u8,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            max_size: 300,
            quality: 80,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directives
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> JournalResult<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    ///
    /// `from_env` delegates here; tests pass a map instead of touching the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> JournalResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let hostname = var("JOURNAL_HOSTNAME", "127.0.0.1");
        let port = var("JOURNAL_PORT", "3000")
            .parse()
            .map_err(|_| JournalError::Config("Invalid port number".to_string()))?;
        let upload_limit = var("JOURNAL_UPLOAD_LIMIT", "10485760")
            .parse()
            .map_err(|_| JournalError::Config("Invalid upload limit".to_string()))?;

        let data_directory: PathBuf = var("JOURNAL_DATA_DIRECTORY", "./data").into();

        let metadata = match var("JOURNAL_METADATA_STORE", "sqlite").to_lowercase().as_str() {
            "sqlite" => MetadataStoreConfig::Sqlite {
                path: lookup("JOURNAL_DATABASE_PATH")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| data_directory.join("photos.db")),
            },
            "memory" => MetadataStoreConfig::Memory,
            other => {
                return Err(JournalError::Config(format!(
                    "Unknown metadata store '{}' (expected 'sqlite' or 'memory')",
                    other
                )))
            }
        };

        let blobstore = if let Some(bucket) = lookup("JOURNAL_S3_BUCKET") {
            BlobstoreConfig::S3 {
                bucket,
                region: var("JOURNAL_S3_REGION", "us-east-1"),
                access_key_id: lookup("JOURNAL_S3_ACCESS_KEY_ID")
                    .ok_or_else(|| JournalError::Config("S3 access key required".to_string()))?,
                secret_access_key: lookup("JOURNAL_S3_SECRET_ACCESS_KEY")
                    .ok_or_else(|| JournalError::Config("S3 secret key required".to_string()))?,
                endpoint: lookup("JOURNAL_S3_ENDPOINT"),
                prefix: var("JOURNAL_S3_PREFIX", "photos/"),
            }
        } else {
            BlobstoreConfig::Disk {
                root: var("JOURNAL_STORAGE_ROOT", "./uploads").into(),
            }
        };

        let thumbnail_subdir = var("JOURNAL_THUMBNAIL_SUBDIR", "thumbnails");
        let write_sidecars = var("JOURNAL_WRITE_SIDECARS", "true")
            .parse()
            .unwrap_or(true);

        let defaults = ThumbnailConfig::default();
        let thumbnails = ThumbnailConfig {
            max_size: lookup("JOURNAL_THUMBNAIL_MAX_SIZE")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_size),
            quality: lookup("JOURNAL_THUMBNAIL_QUALITY")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.quality),
        };

        let level = var("RUST_LOG", DEFAULT_LOG_FILTER);
        let format = match var("JOURNAL_LOG_FORMAT", "pretty").to_lowercase().as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        let config = ServerConfig {
            service: ServiceConfig {
                hostname,
                port,
                upload_limit,
            },
            storage: StorageConfig {
                data_directory,
                metadata,
                blobstore,
                thumbnail_subdir,
                write_sidecars,
            },
            thumbnails,
            logging: LoggingConfig { level, format },
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> JournalResult<()> {
        if self.service.hostname.is_empty() {
            return Err(JournalError::Config("Hostname cannot be empty".to_string()));
        }

        if self.service.upload_limit == 0 {
            return Err(JournalError::Config(
                "Upload limit must be greater than zero".to_string(),
            ));
        }

        if !is_plain_relative(Path::new(&self.storage.thumbnail_subdir)) {
            return Err(JournalError::Config(format!(
                "Thumbnail subdirectory must be a relative path without '..': {}",
                self.storage.thumbnail_subdir
            )));
        }

        if self.thumbnails.max_size == 0 {
            return Err(JournalError::Config(
                "Thumbnail max size must be greater than zero".to_string(),
            ));
        }

        if !(1..=100).contains(&self.thumbnails.quality) {
            return Err(JournalError::Config(
                "Thumbnail quality must be between 1 and 100".to_string(),
            ));
        }

        Ok(())
    }
}

/// True if the path only contains normal components (no root, no `..`)
fn is_plain_relative(path: &Path) -> bool {
    let mut components = path.components().peekable();
    components.peek().is_some() && components.all(|c| matches!(c, Component::Normal(_)))
}
