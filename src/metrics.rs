/// Metrics and telemetry for the photo journal
///
/// Provides Prometheus-compatible metrics for monitoring:
/// - HTTP request counts and latencies
/// - Photo uploads and deletions
/// - Stored bytes and placeholder responses

use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, Encoder,
    HistogramVec, IntCounter, IntCounterVec, TextEncoder,
};

lazy_static! {
    // ========== HTTP Metrics ==========

    /// Total HTTP requests by method, path, and status
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "http_requests_total",
        "Total number of HTTP requests",
        &["method", "path", "status"]
    )
    .unwrap();

    /// HTTP request duration in seconds
    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "http_request_duration_seconds",
        "HTTP request latencies in seconds",
        &["method", "path"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .unwrap();

    // ========== Photo Metrics ==========

    /// Photo uploads by outcome
    pub static ref PHOTO_UPLOADS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "photo_uploads_total",
        "Total number of photo uploads",
        &["status"]
    )
    .unwrap();

    /// Photo deletions
    pub static ref PHOTO_DELETES_TOTAL: IntCounter = register_int_counter!(
        "photo_deletes_total",
        "Total number of photos deleted"
    )
    .unwrap();

    /// Bytes written to blob storage (originals and thumbnails)
    pub static ref BLOB_BYTES_WRITTEN_TOTAL: IntCounter = register_int_counter!(
        "blob_bytes_written_total",
        "Total bytes written to blob storage"
    )
    .unwrap();

    /// Placeholder images served because a blob was missing
    pub static ref PLACEHOLDERS_SERVED_TOTAL: IntCounter = register_int_counter!(
        "placeholders_served_total",
        "Total number of placeholder images served for missing blobs"
    )
    .unwrap();

    // ========== Error Metrics ==========

    /// Server-side errors by error code
    pub static ref ERRORS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "errors_total",
        "Total number of server errors",
        &["error_type"]
    )
    .unwrap();
}

/// Render metrics in Prometheus text format
pub fn render_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::warn!("Failed to encode metrics: {}", e);
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Record an HTTP request
pub fn record_http_request(method: &str, path: &str, status: u16, duration: f64) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path])
        .observe(duration);
}

/// Record an upload attempt
pub fn record_upload(success: bool) {
    PHOTO_UPLOADS_TOTAL
        .with_label_values(&[if success { "success" } else { "failure" }])
        .inc();
}

/// Record a completed deletion
pub fn record_delete() {
    PHOTO_DELETES_TOTAL.inc();
}

/// Record bytes written to the blob backend
pub fn record_blob_bytes(bytes: usize) {
    BLOB_BYTES_WRITTEN_TOTAL.inc_by(bytes as u64);
}

/// Record a placeholder response
pub fn record_placeholder() {
    PLACEHOLDERS_SERVED_TOTAL.inc();
}

/// Record a server error
pub fn record_error(error_type: &str) {
    ERRORS_TOTAL.with_label_values(&[error_type]).inc();
}
