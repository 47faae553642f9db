/// In-memory metadata store
use crate::{
    error::{JournalError, JournalResult},
    photo_store::{models::newest_first, Photo, PhotoStore},
};
use async_trait::async_trait;
use tokio::sync::RwLock;

/// Process-lifetime photo list; contents vanish on restart
#[derive(Default)]
pub struct MemoryPhotoStore {
    photos: RwLock<Vec<Photo>>,
}

impl MemoryPhotoStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PhotoStore for MemoryPhotoStore {
    async fn create(&self, photo: &Photo) -> JournalResult<()> {
        let mut photos = self.photos.write().await;
        if photos.iter().any(|p| p.id == photo.id) {
            return Err(JournalError::Metadata(format!(
                "Photo {} already exists",
                photo.id
            )));
        }
        photos.push(photo.clone());
        Ok(())
    }

    async fn list_all(&self) -> JournalResult<Vec<Photo>> {
        let mut photos = self.photos.read().await.clone();
        photos.sort_by(newest_first);
        Ok(photos)
    }

    async fn get_by_id(&self, id: &str) -> JournalResult<Option<Photo>> {
        Ok(self.photos.read().await.iter().find(|p| p.id == id).cloned())
    }

    async fn delete_by_id(&self, id: &str) -> JournalResult<bool> {
        let mut photos = self.photos.write().await;
        let before = photos.len();
        photos.retain(|p| p.id != id);
        Ok(photos.len() != before)
    }

    fn kind(&self) -> &'static str {
        "memory"
    }
}
