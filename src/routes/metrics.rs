//! Prometheus metrics endpoint
//!
//! Exposes application metrics in Prometheus format for monitoring.

use axum::response::IntoResponse;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::Lazy;

/// Global Prometheus handle for metrics export
static PROMETHEUS_HANDLE: Lazy<PrometheusHandle> = Lazy::new(|| {
    PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus recorder")
});

/// Initialize metrics (call once at startup)
pub fn init_metrics() {
    // Force initialization of the lazy static
    let _ = &*PROMETHEUS_HANDLE;

    register_metrics();
}

/// Register all custom metrics
fn register_metrics() {
    metrics::describe_counter!(
        "genrelay_requests_total",
        "Total number of relay requests processed"
    );
    metrics::describe_histogram!(
        "genrelay_request_duration_seconds",
        "Time until the response head was produced, in seconds"
    );
    metrics::describe_counter!(
        "genrelay_stream_chunks_total",
        "Chunks forwarded to callers in streaming mode"
    );
    metrics::describe_counter!(
        "genrelay_stream_interruptions_total",
        "Streams closed because the upstream failed after commit"
    );
}

/// Prometheus metrics endpoint handler
///
/// Returns metrics in Prometheus text format for scraping.
pub async fn prometheus_metrics() -> impl IntoResponse {
    PROMETHEUS_HANDLE.render()
}

/// Record a request
pub fn record_request(status: &str, target: &str, duration_secs: f64) {
    metrics::counter!("genrelay_requests_total", "status" => status.to_string(), "target" => target.to_string())
        .increment(1);
    metrics::histogram!("genrelay_request_duration_seconds", "target" => target.to_string())
        .record(duration_secs);
}

/// Record one forwarded stream chunk
pub fn record_stream_chunk(target: &str) {
    metrics::counter!("genrelay_stream_chunks_total", "target" => target.to_string()).increment(1);
}

/// Record a stream closed by an upstream failure
pub fn record_stream_interrupted(target: &str) {
    metrics::counter!("genrelay_stream_interruptions_total", "target" => target.to_string())
        .increment(1);
}
