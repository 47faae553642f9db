/// Storage key layout
///
/// Originals live under a `YYYY/MM/DD` folder derived from the date taken,
/// thumbnails under a flat configurable folder. Every user-supplied piece of
/// a key goes through [`sanitize_component`] first.
use chrono::{Datelike, NaiveDate};

/// Longest sanitized name component kept in a key
const MAX_COMPONENT_LEN: usize = 100;

/// Fallback base name when nothing usable survives sanitization
const DEFAULT_BASE_NAME: &str = "photo";

/// Keys for everything stored for one photo
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoKeys {
    /// Stored file name, `{base}_{id}{.ext}`
    pub filename: String,
    pub original: String,
    pub thumbnail: String,
    pub sidecar: String,
}

/// Key derivation for a configured thumbnail folder
#[derive(Debug, Clone)]
pub struct StorageLayout {
    thumbnail_subdir: String,
}

impl StorageLayout {
    pub fn new(thumbnail_subdir: &str) -> Self {
        let thumbnail_subdir = thumbnail_subdir
            .replace('\\', "/")
            .split('/')
            .filter(|part| !part.is_empty() && *part != "." && *part != "..")
            .collect::<Vec<_>>()
            .join("/");

        Self { thumbnail_subdir }
    }

    /// Derive all keys for a new upload
    ///
    /// The original's extension comes from its file name, or failing that
    /// from the declared content type.
    pub fn keys_for(
        &self,
        id: &str,
        original_name: &str,
        declared_type: Option<&str>,
        custom_name: Option<&str>,
        taken_on: NaiveDate,
    ) -> PhotoKeys {
        let folder = date_folder(taken_on);
        let original_base = base_name(original_name);

        let base = custom_name
            .map(sanitize_component)
            .filter(|s| !s.is_empty())
            .or_else(|| Some(sanitize_component(&original_base)).filter(|s| !s.is_empty()))
            .unwrap_or_else(|| DEFAULT_BASE_NAME.to_string());

        let id = sanitize_component(id);
        let stem = format!("{}_{}", base, id);
        let extension = extension_of(original_name).or_else(|| {
            declared_type
                .and_then(extension_for_content_type)
                .map(str::to_string)
        });
        let filename = match extension {
            Some(ext) => format!("{}.{}", stem, ext),
            None => stem.clone(),
        };

        let original = format!("{}/{}", folder, filename);

        PhotoKeys {
            sidecar: sidecar_key_for(&original),
            original,
            thumbnail: if self.thumbnail_subdir.is_empty() {
                format!("{}.jpg", id)
            } else {
                format!("{}/{}.jpg", self.thumbnail_subdir, id)
            },
            filename,
        }
    }
}

impl Default for StorageLayout {
    fn default() -> Self {
        Self::new("thumbnails")
    }
}

/// `YYYY/MM/DD` folder for a date
pub fn date_folder(date: NaiveDate) -> String {
    format!("{:04}/{:02}/{:02}", date.year(), date.month(), date.day())
}

/// Sidecar key colocated with an original: same stem, `.txt` extension
///
/// Derivable from the original key alone, so deletes need no extra metadata.
pub fn sidecar_key_for(original_key: &str) -> String {
    let (dir, file) = match original_key.rfind('/') {
        Some(pos) => original_key.split_at(pos + 1),
        None => ("", original_key),
    };

    let stem = match file.rfind('.') {
        Some(pos) if pos > 0 => &file[..pos],
        _ => file,
    };

    let candidate = format!("{}{}.txt", dir, stem);
    if candidate == original_key {
        format!("{}{}.description.txt", dir, stem)
    } else {
        candidate
    }
}

/// Strip everything outside `[A-Za-z0-9-_]`
pub fn sanitize_component(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .take(MAX_COMPONENT_LEN)
        .collect()
}

/// Client-side file name without any directory part or extension
fn base_name(original_name: &str) -> String {
    let file = original_name
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or(original_name);

    match file.rfind('.') {
        Some(pos) if pos > 0 => file[..pos].to_string(),
        _ => file.to_string(),
    }
}

/// Lower-cased extension, if it is short and alphanumeric
pub fn extension_of(name: &str) -> Option<String> {
    let file = name.rsplit(|c| c == '/' || c == '\\').next()?;
    let pos = file.rfind('.')?;
    if pos == 0 {
        return None;
    }

    let ext = &file[pos + 1..];
    if ext.is_empty() || ext.len() > 10 || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }

    Some(ext.to_ascii_lowercase())
}

/// Content type guessed from a path's extension
pub fn content_type_for_path(path: &str) -> &'static str {
    match extension_of(path).as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

/// Extension for one of the served image types
pub fn extension_for_content_type(content_type: &str) -> Option<&'static str> {
    let essence = content_type.split(';').next().unwrap_or_default().trim();
    match essence.to_ascii_lowercase().as_str() {
        "image/jpeg" | "image/jpg" | "image/pjpeg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

/// True if the file name carries one of the served image extensions
pub fn has_image_extension(name: &str) -> bool {
    content_type_for_path(name).starts_with("image/")
}
