/// S3-compatible blob storage backend
use crate::blob_store::BlobBackend;
use crate::error::{JournalError, JournalResult};
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_s3::config::Builder as S3ConfigBuilder;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use std::sync::Arc;
use tracing::{debug, error, info};

/// S3 blob storage backend
///
/// Supports AWS S3 and S3-compatible storage providers (MinIO, DigitalOcean Spaces, etc.)
#[derive(Clone)]
pub struct S3BlobBackend {
    client: Arc<Client>,
    bucket: String,
    prefix: String,
}

/// Configuration for S3 storage
#[derive(Debug, Clone)]
pub struct S3Config {
    pub bucket: String,
    pub region: String,
    /// Custom endpoint for S3-compatible services, e.g. `http://localhost:9000`
    pub endpoint: Option<String>,
    pub access_key_id: String,
    pub secret_access_key: String,
    /// Prefix for all object keys
    pub prefix: String,
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            bucket: String::new(),
            region: "us-east-1".to_string(),
            endpoint: None,
            access_key_id: String::new(),
            secret_access_key: String::new(),
            prefix: "photos/".to_string(),
        }
    }
}

impl S3BlobBackend {
    /// Create a new S3 blob backend
    pub async fn new(config: S3Config) -> JournalResult<Self> {
        info!(
            "Initializing S3 blob storage (bucket: {}, region: {})",
            config.bucket, config.region
        );

        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "photo-journal",
        );

        let aws_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .load()
            .await;

        let mut s3_config_builder = S3ConfigBuilder::from(&aws_config);

        if let Some(endpoint) = &config.endpoint {
            debug!("Using custom S3 endpoint: {}", endpoint);
            // Path-style addressing for MinIO and similar
            s3_config_builder = s3_config_builder
                .endpoint_url(endpoint)
                .force_path_style(true);
        }

        let client = Client::from_conf(s3_config_builder.build());

        Ok(Self {
            client: Arc::new(client),
            bucket: config.bucket,
            prefix: normalize_prefix(&config.prefix),
        })
    }

    /// Object key for a blob key
    fn get_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }
}

/// Prefix with exactly one trailing slash, or empty
fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{}/", trimmed)
    }
}

#[async_trait]
impl BlobBackend for S3BlobBackend {
    async fn put(&self, key: &str, data: Vec<u8>, mime_type: &str) -> JournalResult<()> {
        let object_key = self.get_key(key);

        debug!(
            "Uploading blob to S3: {} ({} bytes, type: {})",
            object_key,
            data.len(),
            mime_type
        );

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&object_key)
            .body(ByteStream::from(data))
            .content_type(mime_type)
            .send()
            .await
            .map_err(|e| {
                error!("Failed to upload blob to S3: {}", e);
                JournalError::Storage(format!("S3 upload failed: {}", e))
            })?;

        Ok(())
    }

    async fn get(&self, key: &str) -> JournalResult<Option<Vec<u8>>> {
        let object_key = self.get_key(key);

        match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&object_key)
            .send()
            .await
        {
            Ok(response) => {
                let data = response
                    .body
                    .collect()
                    .await
                    .map_err(|e| {
                        JournalError::Storage(format!("Failed to read S3 object: {}", e))
                    })?
                    .into_bytes()
                    .to_vec();

                Ok(Some(data))
            }
            Err(e) => {
                if e.as_service_error().map_or(false, |se| se.is_no_such_key()) {
                    debug!("Blob not found in S3: {}", object_key);
                    Ok(None)
                } else {
                    error!("Failed to download blob from S3: {}", e);
                    Err(JournalError::Storage(format!("S3 download failed: {}", e)))
                }
            }
        }
    }

    async fn delete(&self, key: &str) -> JournalResult<()> {
        let object_key = self.get_key(key);

        // S3 deletes of missing keys succeed
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(&object_key)
            .send()
            .await
            .map_err(|e| {
                error!("Failed to delete blob from S3: {}", e);
                JournalError::Storage(format!("S3 delete failed: {}", e))
            })?;

        Ok(())
    }

    async fn check(&self) -> JournalResult<()> {
        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(|e| JournalError::Storage(format!("S3 bucket not accessible: {}", e)))?;
        Ok(())
    }

    fn location(&self, key: &str) -> String {
        format!("{}{}", super::CLOUD_SCHEME, key)
    }

    fn kind(&self) -> &'static str {
        "s3"
    }
}
