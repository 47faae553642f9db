/// Photo listing, lookup and delete endpoints
use crate::{
    context::AppContext,
    error::JournalResult,
    journal::dates::parse_filter_date,
    photo_store::{Photo, PhotoFilter},
};
use axum::{
    extract::{Path, Query, State},
    routing::{delete, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};

/// Build photo routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/photos", get(list_photos))
        .route("/photos/:id", get(get_photo))
        .route("/delete/:id", delete(delete_photo))
}

/// Gallery query parameters; empty values mean "no filter"
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub search: Option<String>,
    pub date: Option<String>,
}

impl ListQuery {
    fn into_filter(self) -> JournalResult<PhotoFilter> {
        let search = self
            .search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let date = match self.date.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => Some(parse_filter_date(raw)?),
            _ => None,
        };

        Ok(PhotoFilter { search, date })
    }
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub id: String,
    pub message: String,
}

/// List photos, newest taken first
async fn list_photos(
    State(ctx): State<AppContext>,
    Query(query): Query<ListQuery>,
) -> JournalResult<Json<Vec<Photo>>> {
    let filter = query.into_filter()?;
    let photos = ctx.journal.list(&filter).await?;
    Ok(Json(photos))
}

async fn get_photo(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> JournalResult<Json<Photo>> {
    Ok(Json(ctx.journal.get(&id).await?))
}

/// Delete a photo, its blobs and its record
async fn delete_photo(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> JournalResult<Json<DeleteResponse>> {
    let photo = ctx.journal.delete(&id).await?;

    Ok(Json(DeleteResponse {
        id: photo.id,
        message: "Photo deleted successfully".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::{body_json, get, send, test_app, upload_request, Part};
    use crate::blob_store::imaging::encode_test_image;
    use axum::{body::Body, http::Request, http::StatusCode, Router};
    use image::ImageFormat;

    async fn upload(app: &Router, date: &str, custom_name: &str) -> String {
        let data = encode_test_image(12, 12, ImageFormat::Png);
        let response = send(
            app,
            upload_request(&[
                Part::File {
                    name: "file",
                    filename: "shot.png",
                    content_type: "image/png",
                    data: &data,
                },
                Part::Text("dateTaken", date),
                Part::Text("customName", custom_name),
            ]),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        body_json(response).await["id"].as_str().unwrap().to_string()
    }

    fn delete_request(id: &str) -> Request<Body> {
        Request::builder()
            .method("DELETE")
            .uri(format!("/delete/{}", id))
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn test_list_query_ignores_empty_values() {
        let filter = ListQuery {
            search: Some("  ".into()),
            date: Some(String::new()),
        }
        .into_filter()
        .unwrap();
        assert!(filter.is_empty());

        let bad = ListQuery {
            search: None,
            date: Some("05/03/2024".into()),
        };
        assert!(bad.into_filter().is_err());
    }

    #[tokio::test]
    async fn test_list_is_ordered_and_filterable() {
        let (app, _ctx, _dir) = test_app();
        upload(&app, "2023-07-01", "Old").await;
        upload(&app, "2024-03-05", "Newest").await;
        upload(&app, "2024-01-10", "Middle").await;

        let response = send(&app, get("/photos")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let list = body_json(response).await;
        let dates: Vec<&str> = list
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["dateTaken"].as_str().unwrap())
            .collect();
        let mut sorted = dates.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(dates, sorted);
        assert_eq!(dates.len(), 3);

        let list = body_json(send(&app, get("/photos?search=midd&date=")).await).await;
        assert_eq!(list.as_array().unwrap().len(), 1);
        assert_eq!(list[0]["customName"], "Middle");

        let list = body_json(send(&app, get("/photos?date=2024-03-05")).await).await;
        assert_eq!(list.as_array().unwrap().len(), 1);
        assert_eq!(list[0]["customName"], "Newest");

        let response = send(&app, get("/photos?date=yesterday")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_uploaded_ids_are_unique_and_retrievable() {
        let (app, _ctx, _dir) = test_app();
        let first = upload(&app, "2024-03-05", "A").await;
        let second = upload(&app, "2024-03-05", "A").await;
        assert_ne!(first, second);

        for id in [&first, &second] {
            let response = send(&app, get(&format!("/photos/{}", id))).await;
            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(body_json(response).await["id"], id.as_str());
        }
    }

    #[tokio::test]
    async fn test_get_unknown_photo_is_not_found() {
        let (app, _ctx, _dir) = test_app();
        let response = send(&app, get("/photos/does-not-exist")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["error"], "NotFound");
    }

    #[tokio::test]
    async fn test_delete_flow() {
        let (app, _ctx, _dir) = test_app();
        let id = upload(&app, "2024-03-05", "Gone").await;

        let response = send(&app, delete_request(&id)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["id"], id.as_str());
        assert!(body["message"].is_string());

        let response = send(&app, get(&format!("/photos/{}", id))).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let list = body_json(send(&app, get("/photos")).await).await;
        assert!(list.as_array().unwrap().is_empty());

        // Unknown id stays 404 on every attempt
        for _ in 0..2 {
            let response = send(&app, delete_request(&id)).await;
            assert_eq!(response.status(), StatusCode::NOT_FOUND);
        }
    }
}
