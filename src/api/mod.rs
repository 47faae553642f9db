/// API routes and handlers
pub mod health;
pub mod media;
pub mod middleware;
pub mod photos;
pub mod upload;

use crate::{context::AppContext, metrics};
use axum::{http::header, response::IntoResponse, routing::get, Router};

/// Build API routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .merge(upload::routes())
        .merge(photos::routes())
        .merge(media::routes())
        .merge(health::routes())
        .route("/metrics", get(metrics_handler))
}

/// Prometheus scrape endpoint
async fn metrics_handler() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        metrics::render_metrics(),
    )
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::{
        config::ServerConfig,
        context::AppContext,
        journal::{testing::test_journal, PhotoJournal},
        server::build_router,
    };
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, Response},
        Router,
    };
    use std::collections::HashMap;
    use tempfile::TempDir;
    use tower::ServiceExt;

    pub const BOUNDARY: &str = "journal-test-boundary";

    /// Router over an in-memory journal; returns the disk root too
    pub fn test_app() -> (Router, AppContext, TempDir) {
        test_app_with(&[])
    }

    pub fn test_app_with(vars: &[(&str, &str)]) -> (Router, AppContext, TempDir) {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let config = ServerConfig::from_lookup(|key| vars.get(key).cloned()).unwrap();
        let (journal, dir): (PhotoJournal, TempDir) = test_journal();
        let (app, ctx) = app_for(config, journal);
        (app, ctx, dir)
    }

    /// Router over a prepared journal
    pub fn app_for(config: ServerConfig, journal: PhotoJournal) -> (Router, AppContext) {
        let ctx = AppContext::from_parts(config, journal, None);
        (build_router(ctx.clone()), ctx)
    }

    /// Default configuration without touching the environment
    pub fn default_config() -> ServerConfig {
        ServerConfig::from_lookup(|_| None).unwrap()
    }

    /// One part of a multipart body
    pub enum Part<'a> {
        Text(&'a str, &'a str),
        File {
            name: &'a str,
            filename: &'a str,
            content_type: &'a str,
            data: &'a [u8],
        },
    }

    pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
        let mut body = Vec::new();
        for part in parts {
            body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
            match part {
                Part::Text(name, value) => {
                    body.extend_from_slice(
                        format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name)
                            .as_bytes(),
                    );
                    body.extend_from_slice(value.as_bytes());
                }
                Part::File {
                    name,
                    filename,
                    content_type,
                    data,
                } => {
                    body.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                             Content-Type: {}\r\n\r\n",
                            name, filename, content_type
                        )
                        .as_bytes(),
                    );
                    body.extend_from_slice(data);
                }
            }
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        body
    }

    pub fn upload_request(parts: &[Part<'_>]) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(multipart_body(parts)))
            .unwrap()
    }

    pub fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
        app.clone().oneshot(request).await.unwrap()
    }

    pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
        to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec()
    }

    pub async fn body_json(response: Response<Body>) -> serde_json::Value {
        serde_json::from_slice(&body_bytes(response).await).unwrap()
    }
}
