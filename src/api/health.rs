/// Health check endpoints for liveness and readiness probes
///
/// Supports two types of probes:
/// - Liveness: Is the process alive? (restart if not)
/// - Readiness: Can it serve traffic? Both the metadata store and the blob
///   backend must answer.
use crate::{context::AppContext, db, error::JournalResult};
use axum::{extract::State, http::StatusCode, response::Json, routing::get, Router};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Health status response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    /// Overall status: "healthy" or "unhealthy"
    pub status: String,

    pub version: String,

    pub uptime_seconds: f64,

    /// Individual component checks
    pub checks: Vec<ComponentHealth>,
}

/// Health status of individual component
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub name: String,

    /// Status: "healthy" or "unhealthy"
    pub status: String,

    /// Backend in use, e.g. "sqlite" or "disk"
    pub kind: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Build health check routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/health", get(health_basic))
        .route("/health/live", get(liveness_probe))
        .route("/health/ready", get(readiness_probe))
}

/// Basic health check
pub async fn health_basic() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Liveness probe
///
/// If we can respond, we're alive.
pub async fn liveness_probe() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "alive",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Readiness probe
///
/// Returns 200 with per-component detail when everything answers, 503
/// otherwise.
pub async fn readiness_probe(State(ctx): State<AppContext>) -> (StatusCode, Json<HealthStatus>) {
    let checks = vec![
        timed_check("metadata_store", ctx.journal.photo_store().kind(), check_metadata(&ctx)).await,
        timed_check("blob_storage", ctx.journal.blob_store().backend_kind(), check_blob_storage(&ctx)).await,
    ];

    let overall_status = determine_overall_status(&checks);
    if overall_status != "healthy" {
        tracing::warn!(?checks, "readiness_probe_failed");
    }

    let status_code = if overall_status == "healthy" {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let health = HealthStatus {
        status: overall_status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: ctx.started_at.elapsed().as_secs_f64(),
        checks,
    };

    (status_code, Json(health))
}

async fn timed_check(
    name: &str,
    kind: &str,
    check: impl std::future::Future<Output = JournalResult<()>>,
) -> ComponentHealth {
    let start = Instant::now();
    let result = check.await;
    let response_time_ms = Some(start.elapsed().as_millis() as u64);

    let (status, error) = match result {
        Ok(()) => ("healthy", None),
        Err(e) => {
            // Detail stays in the logs
            tracing::warn!(component = name, error = %e, "health_check_failed");
            ("unhealthy", Some("unavailable".to_string()))
        }
    };

    ComponentHealth {
        name: name.to_string(),
        status: status.to_string(),
        kind: kind.to_string(),
        response_time_ms,
        error,
    }
}

/// Check metadata store connectivity
async fn check_metadata(ctx: &AppContext) -> JournalResult<()> {
    match &ctx.db {
        Some(pool) => db::test_connection(pool).await,
        // In-memory store is always reachable
        None => Ok(()),
    }
}

/// Check blob storage availability
async fn check_blob_storage(ctx: &AppContext) -> JournalResult<()> {
    ctx.journal.blob_store().check().await
}

/// Determine overall health status from individual checks
fn determine_overall_status(checks: &[ComponentHealth]) -> &'static str {
    if checks.iter().all(|c| c.status == "healthy") {
        "healthy"
    } else {
        "unhealthy"
    }
}
