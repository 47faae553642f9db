/// Photo upload pipeline
use super::{dates, PhotoJournal};
use crate::{
    blob_store::{
        content_type_for_path, imaging, layout::has_image_extension, store::THUMBNAIL_MIME_TYPE,
    },
    error::{JournalError, JournalResult},
    metrics,
    photo_store::Photo,
};
use chrono::Utc;
use uuid::Uuid;

/// Fresh ids to try before giving up on a collision
const MAX_ID_ATTEMPTS: usize = 3;

/// Content types that say nothing about the payload
const GENERIC_CONTENT_TYPES: &[&str] = &["", "application/octet-stream", "binary/octet-stream"];

/// Everything a client sends with one upload
#[derive(Debug, Clone, Default)]
pub struct UploadRequest {
    /// File name as given by the client
    pub original_name: String,
    /// Declared content type of the file part
    pub content_type: Option<String>,
    pub data: Vec<u8>,
    pub custom_name: Option<String>,
    pub description: Option<String>,
    pub date_taken: Option<String>,
}

impl UploadRequest {
    /// Declared type without parameters, lower-cased
    fn declared_type(&self) -> Option<String> {
        self.content_type.as_deref().map(|ct| {
            ct.split(';')
                .next()
                .unwrap_or_default()
                .trim()
                .to_ascii_lowercase()
        })
    }

    /// Reject anything that is not plausibly an image
    fn validate(&self) -> JournalResult<()> {
        if self.data.is_empty() {
            return Err(JournalError::InvalidInput("No file uploaded".to_string()));
        }

        match self.declared_type() {
            Some(ct) if ct.starts_with("image/") => Ok(()),
            Some(ct) if !GENERIC_CONTENT_TYPES.contains(&ct.as_str()) => Err(
                JournalError::InvalidInput(format!("File must be an image (got {})", ct)),
            ),
            _ if has_image_extension(&self.original_name) => Ok(()),
            _ => Err(JournalError::InvalidInput(
                "File must be an image".to_string(),
            )),
        }
    }

    /// Type recorded with the stored original
    fn storage_type(&self, key: &str) -> String {
        match self.declared_type() {
            Some(ct) if ct.starts_with("image/") => ct,
            _ => content_type_for_path(key).to_string(),
        }
    }
}

/// Trimmed value, `None` when blank
fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl PhotoJournal {
    /// Store a new photo and record its metadata
    ///
    /// The original must be written for the upload to succeed. Thumbnail
    /// generation is skipped for undecodable images, and a failed sidecar
    /// write is only logged. If the metadata insert fails the written blobs
    /// are removed again.
    pub async fn upload(&self, request: UploadRequest) -> JournalResult<Photo> {
        let result = self.store_upload(request).await;
        metrics::record_upload(result.is_ok());
        result
    }

    async fn store_upload(&self, request: UploadRequest) -> JournalResult<Photo> {
        request.validate()?;

        let now = Utc::now();
        let date_taken = dates::resolve_date_taken(request.date_taken.as_deref(), now)?;
        let custom_name = non_blank(request.custom_name.clone());
        let description = non_blank(request.description.clone());
        let id = self.fresh_id().await?;

        let declared_type = request.declared_type();
        let keys = self.blobs.layout().keys_for(
            &id,
            &request.original_name,
            declared_type.as_deref(),
            custom_name.as_deref(),
            date_taken.date_naive(),
        );
        let mime_type = request.storage_type(&keys.original);

        let options = self.blobs.thumbnail_options().clone();
        let data = request.data;
        let (data, derived) = tokio::task::spawn_blocking(move || {
            let derived = imaging::derive(&data, &options);
            (data, derived)
        })
        .await
        .map_err(|e| JournalError::Internal(format!("Image task failed: {}", e)))?;

        let file_size = data.len() as i64;
        let file_path = self.blobs.put(&keys.original, data, &mime_type).await?;

        let thumbnail_path = match derived.thumbnail {
            Some(thumbnail) => match self
                .blobs
                .put(&keys.thumbnail, thumbnail, THUMBNAIL_MIME_TYPE)
                .await
            {
                Ok(location) => Some(location),
                Err(e) => {
                    self.blobs.remove_quietly(&file_path).await;
                    return Err(e);
                }
            },
            None => {
                tracing::warn!(id = %id, "No thumbnail generated for upload");
                None
            }
        };

        if let Some(text) = description.as_deref() {
            if let Err(e) = self.blobs.put_sidecar(&keys.sidecar, text).await {
                tracing::warn!(id = %id, error = %e, "Failed to write description sidecar");
            }
        }

        let photo = Photo {
            id,
            filename: keys.filename,
            original_name: request.original_name,
            custom_name,
            description,
            date_taken: dates::format_timestamp(date_taken),
            upload_date: dates::format_timestamp(now),
            file_path,
            thumbnail_path,
            file_size,
            width: derived.dimensions.map(|d| i64::from(d.width)),
            height: derived.dimensions.map(|d| i64::from(d.height)),
        };

        if let Err(e) = self.photos.create(&photo).await {
            self.blobs
                .remove_photo_blobs(&photo.file_path, photo.thumbnail_path.as_deref())
                .await;
            return Err(e);
        }

        tracing::info!(
            id = %photo.id,
            file_path = %photo.file_path,
            bytes = photo.file_size,
            "photo_uploaded"
        );

        Ok(photo)
    }

    /// A new id not yet present in the metadata store
    async fn fresh_id(&self) -> JournalResult<String> {
        for _ in 0..MAX_ID_ATTEMPTS {
            let id = Uuid::new_v4().to_string();
            if self.photos.get_by_id(&id).await?.is_none() {
                return Ok(id);
            }
        }
        Err(JournalError::Internal(
            "Could not allocate a unique photo id".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{count_files, faulty_journal, image_request, test_journal, Faults};
    use super::*;
    use crate::blob_store::imaging::{encode_test_image, extract_dimensions};
    use crate::photo_store::PhotoFilter;
    use image::ImageFormat;

    #[tokio::test]
    async fn test_upload_stores_original_thumbnail_and_sidecar() {
        let (journal, dir) = test_journal();
        let data = encode_test_image(800, 600, ImageFormat::Jpeg);

        let mut request = image_request("a.jpg", data.clone());
        request.custom_name = Some("Site-1".to_string());
        request.description = Some("Pour day".to_string());
        request.date_taken = Some("2024-03-05".to_string());

        let photo = journal.upload(request).await.unwrap();

        assert_eq!(photo.date_taken, "2024-03-05T00:00:00Z");
        assert_eq!(photo.filename, format!("Site-1_{}.jpg", photo.id));
        assert_eq!(photo.file_path, format!("2024/03/05/Site-1_{}.jpg", photo.id));
        assert_eq!(photo.file_size, data.len() as i64);
        assert_eq!((photo.width, photo.height), (Some(800), Some(600)));
        assert_eq!(photo.custom_name.as_deref(), Some("Site-1"));

        let original = std::fs::read(dir.path().join(&photo.file_path)).unwrap();
        assert_eq!(original, data);

        let thumbnail_path = photo.thumbnail_path.clone().unwrap();
        assert_eq!(thumbnail_path, format!("thumbnails/{}.jpg", photo.id));
        let thumbnail = std::fs::read(dir.path().join(&thumbnail_path)).unwrap();
        let dims = extract_dimensions(&thumbnail).unwrap();
        assert_eq!((dims.width, dims.height), (300, 225));
        assert_eq!(image::guess_format(&thumbnail).unwrap(), ImageFormat::Jpeg);

        let sidecar = dir.path().join(format!("2024/03/05/Site-1_{}.txt", photo.id));
        assert_eq!(std::fs::read_to_string(sidecar).unwrap(), "Pour day");

        let listed = journal.list(&PhotoFilter::default()).await.unwrap();
        assert_eq!(listed, vec![photo]);
    }

    #[tokio::test]
    async fn test_small_images_are_not_upscaled() {
        let (journal, dir) = test_journal();
        let data = encode_test_image(120, 80, ImageFormat::Png);

        let photo = journal.upload(image_request("small.png", data)).await.unwrap();

        let thumbnail = std::fs::read(dir.path().join(photo.thumbnail_path.unwrap())).unwrap();
        let dims = extract_dimensions(&thumbnail).unwrap();
        assert_eq!((dims.width, dims.height), (120, 80));
    }

    #[tokio::test]
    async fn test_upload_without_description_writes_no_sidecar() {
        let (journal, dir) = test_journal();
        let data = encode_test_image(10, 10, ImageFormat::Png);

        let mut request = image_request("a.png", data);
        request.description = Some("   ".to_string());
        let photo = journal.upload(request).await.unwrap();

        assert!(photo.description.is_none());
        let sidecar = dir.path().join(&photo.file_path).with_extension("txt");
        assert!(!sidecar.exists());
    }

    #[tokio::test]
    async fn test_undecodable_image_is_stored_without_thumbnail() {
        let (journal, dir) = test_journal();

        let photo = journal
            .upload(image_request("broken.jpg", b"not really a jpeg".to_vec()))
            .await
            .unwrap();

        assert!(photo.thumbnail_path.is_none());
        assert!(photo.width.is_none() && photo.height.is_none());
        assert!(dir.path().join(&photo.file_path).exists());
    }

    #[tokio::test]
    async fn test_non_image_is_rejected_without_writes() {
        let (journal, dir) = test_journal();

        let mut request = image_request("notes.txt", b"hello".to_vec());
        request.content_type = Some("text/plain".to_string());
        let result = journal.upload(request).await;

        assert!(matches!(result, Err(JournalError::InvalidInput(_))));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
        assert!(journal.list(&PhotoFilter::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_generic_content_type_falls_back_to_extension() {
        let (journal, _dir) = test_journal();
        let data = encode_test_image(10, 10, ImageFormat::Png);

        let mut request = image_request("a.png", data.clone());
        request.content_type = Some("application/octet-stream".to_string());
        assert!(journal.upload(request).await.is_ok());

        let mut request = image_request("a.bin", data);
        request.content_type = None;
        assert!(matches!(
            journal.upload(request).await,
            Err(JournalError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_file_is_rejected() {
        let (journal, _dir) = test_journal();
        let result = journal.upload(image_request("a.jpg", Vec::new())).await;
        assert!(matches!(result, Err(JournalError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_invalid_date_taken_is_rejected() {
        let (journal, dir) = test_journal();
        let data = encode_test_image(10, 10, ImageFormat::Png);

        let mut request = image_request("a.png", data);
        request.date_taken = Some("last tuesday".to_string());

        assert!(matches!(
            journal.upload(request).await,
            Err(JournalError::InvalidInput(_))
        ));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_missing_date_taken_uses_upload_time() {
        let (journal, _dir) = test_journal();
        let data = encode_test_image(10, 10, ImageFormat::Png);

        let photo = journal.upload(image_request("a.png", data)).await.unwrap();
        assert_eq!(photo.date_taken, photo.upload_date);
    }

    #[tokio::test]
    async fn test_hostile_names_stay_inside_date_folder() {
        let (journal, dir) = test_journal();
        let data = encode_test_image(10, 10, ImageFormat::Png);

        let mut request = image_request("../../../etc/passwd.png", data);
        request.custom_name = Some("../../evil".to_string());
        request.date_taken = Some("2024-03-05T10:00:00Z".to_string());

        let photo = journal.upload(request).await.unwrap();

        assert!(photo.file_path.starts_with("2024/03/05/"));
        assert!(!photo.file_path.contains(".."));
        assert_eq!(photo.filename, format!("evil_{}.png", photo.id));
        assert!(dir.path().join(&photo.file_path).exists());
    }

    #[tokio::test]
    async fn test_listing_is_newest_taken_first() {
        let (journal, _dir) = test_journal();
        let data = encode_test_image(10, 10, ImageFormat::Png);

        for date in ["2023-01-01", "2024-06-01", "2024-01-15"] {
            let mut request = image_request("a.png", data.clone());
            request.date_taken = Some(date.to_string());
            journal.upload(request).await.unwrap();
        }

        let dates: Vec<_> = journal
            .list(&PhotoFilter::default())
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.date_taken)
            .collect();
        assert_eq!(
            dates,
            vec![
                "2024-06-01T00:00:00Z",
                "2024-01-15T00:00:00Z",
                "2023-01-01T00:00:00Z"
            ]
        );
    }

    #[tokio::test]
    async fn test_nameless_file_gets_extension_from_declared_type() {
        let (journal, dir) = test_journal();
        let data = encode_test_image(10, 10, ImageFormat::Png);

        let mut request = image_request("", data.clone());
        request.content_type = Some("image/png".to_string());
        let photo = journal.upload(request).await.unwrap();

        assert_eq!(photo.filename, format!("photo_{}.png", photo.id));
        assert!(dir.path().join(&photo.file_path).exists());

        let stored = journal
            .open(&photo.id, crate::journal::ImageVariant::Original)
            .await
            .unwrap();
        assert_eq!(stored.content_type, "image/png");
        assert_eq!(stored.data, data);
    }

    #[tokio::test]
    async fn test_original_write_failure_is_storage_error() {
        let (journal, dir) = faulty_journal(Faults {
            fail_puts_under: Some(""),
            ..Faults::default()
        });
        let data = encode_test_image(10, 10, ImageFormat::Png);

        let err = journal.upload(image_request("a.png", data)).await.unwrap_err();

        assert!(matches!(err, JournalError::Storage(_)));
        assert_eq!(err.status().1, "StorageFailure");
        assert_eq!(count_files(dir.path()), 0);
        assert!(journal.list(&PhotoFilter::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_thumbnail_write_failure_removes_original() {
        let (journal, dir) = faulty_journal(Faults {
            fail_puts_under: Some("thumbnails/"),
            ..Faults::default()
        });
        let data = encode_test_image(64, 64, ImageFormat::Png);

        let mut request = image_request("a.png", data);
        request.description = Some("never written".to_string());
        let err = journal.upload(request).await.unwrap_err();

        assert_eq!(err.status().1, "StorageFailure");
        assert_eq!(count_files(dir.path()), 0);
        assert!(journal.list(&PhotoFilter::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_insert_removes_written_blobs() {
        let (journal, dir) = faulty_journal(Faults {
            reject_inserts: true,
            ..Faults::default()
        });
        let data = encode_test_image(64, 64, ImageFormat::Png);

        let mut request = image_request("a.png", data);
        request.description = Some("sidecar too".to_string());
        let err = journal.upload(request).await.unwrap_err();

        assert!(matches!(err, JournalError::Metadata(_)));
        assert_eq!(err.status().1, "MetadataFailure");
        assert_eq!(count_files(dir.path()), 0);
        assert!(journal.list(&PhotoFilter::default()).await.unwrap().is_empty());
    }
}
