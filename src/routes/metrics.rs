//! Prometheus metrics endpoint
//!
//! Exposes relay metrics in Prometheus format for monitoring.

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

fn register_metrics() {
    metrics::describe_counter!(
        "geminipy_requests_total",
        "Total number of relayed requests"
    );
    metrics::describe_histogram!(
        "geminipy_request_duration_seconds",
        "Time until the relayed response (or stream head) was ready"
    );
    metrics::describe_counter!(
        "geminipy_stream_chunks_total",
        "Total chunks forwarded on streaming responses"
    );
}

/// Prometheus metrics endpoint handler
pub async fn prometheus_metrics() -> impl IntoResponse {
    PROMETHEUS_HANDLE.render()
}

/// Record a relayed request
pub fn record_request(operation: &str, version: &str, status: u16, duration_secs: f64) {
    metrics::counter!(
        "geminipy_requests_total",
        "operation" => operation.to_string(),
        "version" => version.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!(
        "geminipy_request_duration_seconds",
        "operation" => operation.to_string()
    )
    .record(duration_secs);
}

/// Record chunks forwarded by one streaming relay
pub fn record_stream_chunks(version: &str, count: u64) {
    metrics::counter!("geminipy_stream_chunks_total", "version" => version.to_string())
        .increment(count);
}
