/// Photo upload endpoint
use crate::{
    context::AppContext,
    error::{JournalError, JournalResult},
    journal::UploadRequest,
    photo_store::Photo,
};
use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::StatusCode,
    routing::post,
    Json, Router,
};

/// Build upload routes
pub fn routes() -> Router<AppContext> {
    Router::new().route("/upload", post(upload_photo))
}

/// Upload a photo
///
/// Multipart form with a required `file` part and optional `customName`,
/// `description` and `dateTaken` text parts. Unknown parts are ignored.
async fn upload_photo(
    State(ctx): State<AppContext>,
    multipart: Result<Multipart, MultipartRejection>,
) -> JournalResult<Json<Photo>> {
    let mut multipart = multipart
        .map_err(|e| JournalError::InvalidInput(format!("Expected multipart form data: {}", e)))?;

    let mut request = UploadRequest::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            "file" => {
                request.original_name = field.file_name().unwrap_or_default().to_string();
                request.content_type = field.content_type().map(str::to_string);
                request.data = field.bytes().await.map_err(multipart_error)?.to_vec();
            }
            "customName" => {
                request.custom_name = Some(field.text().await.map_err(multipart_error)?);
            }
            "description" => {
                request.description = Some(field.text().await.map_err(multipart_error)?);
            }
            "dateTaken" => {
                request.date_taken = Some(field.text().await.map_err(multipart_error)?);
            }
            other => {
                tracing::debug!(field = other, "Ignoring unknown upload field");
            }
        }
    }

    let photo = ctx.journal.upload(request).await?;
    Ok(Json(photo))
}

/// Map a multipart read failure, keeping the body limit distinct
fn multipart_error(e: MultipartError) -> JournalError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        JournalError::PayloadTooLarge(e.body_text())
    } else {
        JournalError::InvalidInput(e.body_text())
    }
}
