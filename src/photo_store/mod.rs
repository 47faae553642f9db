/// Photo Metadata Store
///
/// Holds one record per uploaded photo. Two interchangeable backends exist:
/// a durable SQLite table and a process-lifetime in-memory list.

pub mod memory;
pub mod models;
pub mod sqlite;

pub use memory::MemoryPhotoStore;
pub use models::{Photo, PhotoFilter};
pub use sqlite::SqlitePhotoStore;

use crate::error::JournalResult;
use async_trait::async_trait;

/// Metadata store trait
///
/// Implementations must apply each call fully or not at all.
#[async_trait]
pub trait PhotoStore: Send + Sync {
    /// Insert a new record; a duplicate id is an error
    async fn create(&self, photo: &Photo) -> JournalResult<()>;

    /// All records, newest `dateTaken` first
    async fn list_all(&self) -> JournalResult<Vec<Photo>>;

    /// Fetch a record by id
    async fn get_by_id(&self, id: &str) -> JournalResult<Option<Photo>>;

    /// Remove a record; returns whether it existed
    async fn delete_by_id(&self, id: &str) -> JournalResult<bool>;

    /// Short backend name for logs and health output
    fn kind(&self) -> &'static str;
}
