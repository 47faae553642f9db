/// Photo metadata models
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One uploaded photo
///
/// Dates are RFC 3339 UTC strings with second precision, so string order is
/// chronological order.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[sqlx(rename_all = "camelCase")]
pub struct Photo {
    pub id: String,
    pub filename: String,
    pub original_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub date_taken: String,
    pub upload_date: String,
    pub file_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_path: Option<String>,
    pub file_size: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<i64>,
}

impl Photo {
    /// Name offered to the user when downloading
    ///
    /// The custom name wins; it gets the original extension appended when it
    /// has none of its own.
    pub fn download_name(&self) -> String {
        match self.custom_name.as_deref().map(str::trim) {
            Some(custom) if !custom.is_empty() => {
                let ext = std::path::Path::new(&self.original_name)
                    .extension()
                    .and_then(|e| e.to_str());
                let has_ext = std::path::Path::new(custom).extension().is_some();
                match ext {
                    Some(ext) if !has_ext => format!("{}.{}", custom, ext),
                    _ => custom.to_string(),
                }
            }
            _ => self.original_name.clone(),
        }
    }

    /// Calendar date (UTC) the photo was taken on
    pub fn taken_on(&self) -> Option<NaiveDate> {
        chrono::DateTime::parse_from_rfc3339(&self.date_taken)
            .ok()
            .map(|dt| dt.naive_utc().date())
    }
}

/// Gallery filters for listing
#[derive(Debug, Clone, Default)]
pub struct PhotoFilter {
    /// Case-insensitive substring of custom name, description, or original name
    pub search: Option<String>,
    /// Only photos taken on this date
    pub date: Option<NaiveDate>,
}

impl PhotoFilter {
    pub fn is_empty(&self) -> bool {
        self.search.as_deref().map_or(true, |s| s.trim().is_empty()) && self.date.is_none()
    }

    pub fn matches(&self, photo: &Photo) -> bool {
        let matches_search = match self.search.as_deref().map(str::trim) {
            Some(term) if !term.is_empty() => {
                let term = term.to_lowercase();
                [
                    photo.custom_name.as_deref(),
                    photo.description.as_deref(),
                    Some(photo.original_name.as_str()),
                ]
                .into_iter()
                .flatten()
                .any(|field| field.to_lowercase().contains(&term))
            }
            _ => true,
        };

        let matches_date = match self.date {
            Some(date) => photo.taken_on() == Some(date),
            None => true,
        };

        matches_search && matches_date
    }
}

/// Sort key used by every store: newest `dateTaken` first, then newest upload
pub(crate) fn newest_first(a: &Photo, b: &Photo) -> std::cmp::Ordering {
    b.date_taken
        .cmp(&a.date_taken)
        .then_with(|| b.upload_date.cmp(&a.upload_date))
}

#[cfg(test)]
pub(crate) fn sample_photo(id: &str, date_taken: &str) -> Photo {
    Photo {
        id: id.to_string(),
        filename: format!("IMG_{}.jpg", id),
        original_name: "IMG_0001.jpg".to_string(),
        custom_name: None,
        description: None,
        date_taken: date_taken.to_string(),
        upload_date: "2024-06-01T12:00:00Z".to_string(),
        file_path: format!("2024/03/05/IMG_{}.jpg", id),
        thumbnail_path: Some(format!("thumbnails/{}.jpg", id)),
        file_size: 1234,
        width: Some(640),
        height: Some(480),
    }
}
