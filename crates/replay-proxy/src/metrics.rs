//! Prometheus metrics for replay-proxy.
//!
//! Tracks request outcomes, upstream latency, artifact writes and lifecycle
//! operations on the log and mock collections.
use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, Encoder, HistogramVec, TextEncoder,
};
use tracing::warn;

lazy_static! {
    /// Total number of proxied requests
    pub static ref REQUESTS_TOTAL: CounterVec = register_counter_vec!(
        "replay_requests_total",
        "Total number of requests handled by the interaction engine",
        &["method", "status", "outcome"]  // outcome: mock|forward|rejected|error
    )
    .unwrap();

    /// Upstream round-trip duration
    pub static ref FORWARD_DURATION_MS: HistogramVec = register_histogram_vec!(
        "replay_forward_duration_ms",
        "Duration of upstream requests in milliseconds",
        &["method"],
        vec![1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0, 30000.0]
    )
    .unwrap();

    /// Interaction record writes
    pub static ref RECORDS_WRITTEN_TOTAL: CounterVec = register_counter_vec!(
        "replay_records_written_total",
        "Interaction records persisted to the log collection",
        &["result"]  // result: ok|fallback|failed
    )
    .unwrap();

    /// Log/mock lifecycle operations
    pub static ref LIFECYCLE_OPS_TOTAL: CounterVec = register_counter_vec!(
        "replay_lifecycle_ops_total",
        "Lifecycle operations on recorded artifacts",
        &["operation", "result"]  // operation: list|fetch|delete_all|promote|demote|is_mocked
    )
    .unwrap();
}

/// Collect and return all metrics in Prometheus text format
pub fn collect_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        warn!("Failed to encode metrics: {}", e);
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

pub fn record_request(method: &str, status: u16, outcome: &str) {
    REQUESTS_TOTAL
        .with_label_values(&[method, &status.to_string(), outcome])
        .inc();
}

pub fn record_forward_duration(method: &str, duration_ms: f64) {
    FORWARD_DURATION_MS
        .with_label_values(&[method])
        .observe(duration_ms);
}

pub fn record_artifact_write(result: &str) {
    RECORDS_WRITTEN_TOTAL.with_label_values(&[result]).inc();
}

pub fn record_lifecycle_op(operation: &str, success: bool) {
    let result = if success { "success" } else { "error" };
    LIFECYCLE_OPS_TOTAL
        .with_label_values(&[operation, result])
        .inc();
}
