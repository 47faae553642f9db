/// Image serving and download endpoints
use crate::{
    context::AppContext,
    error::{JournalError, JournalResult},
    journal::{ImageVariant, StoredImage},
};
use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};

/// Stored blobs never change under a given id
const IMMUTABLE_CACHE: &str = "public, max-age=31536000, immutable";

/// Build media routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/image/:id", get(serve_image))
        .route("/thumbnail/:id", get(serve_thumbnail))
        .route("/download/:id", get(download_photo))
}

/// Serve the original inline
async fn serve_image(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> JournalResult<Response> {
    let image = ctx.journal.open(&id, ImageVariant::Original).await?;
    image_response(image, &headers, None)
}

/// Serve the thumbnail, or the original when none was generated
async fn serve_thumbnail(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> JournalResult<Response> {
    let image = ctx.journal.open(&id, ImageVariant::Thumbnail).await?;
    image_response(image, &headers, None)
}

/// Serve the original as an attachment named after the photo
async fn download_photo(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> JournalResult<Response> {
    let image = ctx.journal.open(&id, ImageVariant::Original).await?;
    let disposition = content_disposition(&image.photo.download_name());
    image_response(image, &headers, Some(disposition))
}

fn image_response(
    image: StoredImage,
    request_headers: &HeaderMap,
    disposition: Option<String>,
) -> JournalResult<Response> {
    let etag = format!("\"{}\"", image.photo.id);
    let etag_value = HeaderValue::from_str(&etag)
        .map_err(|e| JournalError::Internal(format!("Invalid ETag: {}", e)))?;

    if !image.placeholder && if_none_match(request_headers, &etag) {
        let mut response = StatusCode::NOT_MODIFIED.into_response();
        let headers = response.headers_mut();
        headers.insert(header::ETAG, etag_value);
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static(IMMUTABLE_CACHE));
        return Ok(response);
    }

    let length = image.data.len();
    let mut response = Body::from(image.data).into_response();
    let headers = response.headers_mut();

    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(image.content_type));
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(length));

    if image.placeholder {
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    } else {
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static(IMMUTABLE_CACHE));
        headers.insert(header::ETAG, etag_value);
    }

    if let Some(disposition) = disposition {
        let value = HeaderValue::from_str(&disposition)
            .map_err(|e| JournalError::Internal(format!("Invalid Content-Disposition: {}", e)))?;
        headers.insert(header::CONTENT_DISPOSITION, value);
    }

    Ok(response)
}

/// True if `If-None-Match` lists `etag` (or `*`)
fn if_none_match(headers: &HeaderMap, etag: &str) -> bool {
    headers
        .get_all(header::IF_NONE_MATCH)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .map(|tag| tag.trim())
        .any(|tag| tag == "*" || tag.strip_prefix("W/").unwrap_or(tag) == etag)
}

/// `attachment` disposition with an ASCII fallback and an RFC 5987 name
fn content_disposition(filename: &str) -> String {
    let fallback: String = filename
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii_graphic() || c == ' ' => c,
            _ => '_',
        })
        .collect();

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(filename)
    )
}
