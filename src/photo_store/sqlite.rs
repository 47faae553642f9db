/// SQLite-backed metadata store
use crate::{
    error::JournalResult,
    photo_store::{Photo, PhotoStore},
};
use async_trait::async_trait;
use sqlx::SqlitePool;

const PHOTO_COLUMNS: &str = "id, filename, originalName, customName, description, dateTaken, \
     uploadDate, filePath, thumbnailPath, fileSize, width, height";

/// Durable photo table in SQLite
#[derive(Clone)]
pub struct SqlitePhotoStore {
    db: SqlitePool,
}

impl SqlitePhotoStore {
    /// Wrap a pool whose migrations have already run
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PhotoStore for SqlitePhotoStore {
    async fn create(&self, photo: &Photo) -> JournalResult<()> {
        sqlx::query(
            r#"
            INSERT INTO photos (
                id, filename, originalName, customName, description,
                dateTaken, uploadDate, filePath, thumbnailPath,
                fileSize, width, height
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&photo.id)
        .bind(&photo.filename)
        .bind(&photo.original_name)
        .bind(&photo.custom_name)
        .bind(&photo.description)
        .bind(&photo.date_taken)
        .bind(&photo.upload_date)
        .bind(&photo.file_path)
        .bind(&photo.thumbnail_path)
        .bind(photo.file_size)
        .bind(photo.width)
        .bind(photo.height)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    async fn list_all(&self) -> JournalResult<Vec<Photo>> {
        let photos = sqlx::query_as::<_, Photo>(&format!(
            "SELECT {} FROM photos ORDER BY dateTaken DESC, uploadDate DESC",
            PHOTO_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(photos)
    }

    async fn get_by_id(&self, id: &str) -> JournalResult<Option<Photo>> {
        let photo = sqlx::query_as::<_, Photo>(&format!(
            "SELECT {} FROM photos WHERE id = ?1",
            PHOTO_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        Ok(photo)
    }

    async fn delete_by_id(&self, id: &str) -> JournalResult<bool> {
        let result = sqlx::query("DELETE FROM photos WHERE id = ?1")
            .bind(id)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    fn kind(&self) -> &'static str {
        "sqlite"
    }
}
