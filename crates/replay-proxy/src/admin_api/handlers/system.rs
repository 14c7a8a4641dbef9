//! System handlers: health, metrics.

use crate::admin_api::types::*;
use crate::metrics::collect_metrics;
use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};

/// GET /api/health - Health check
pub fn handle_health() -> Response<Full<Bytes>> {
    json_response(StatusCode::OK, &serde_json::json!({"status": "ok"}))
}

/// GET /api/metrics - Prometheus metrics
pub fn handle_metrics() -> Response<Full<Bytes>> {
    metrics_response(collect_metrics())
}
