//! Request/response bodies and response helpers for the lifecycle API.

use crate::proxy::headers::{VALUE_JSON, VALUE_METRICS};
use bytes::Bytes;
use http_body_util::Full;
use hyper::header::CONTENT_TYPE;
use hyper::{Response, StatusCode};
use serde::{Deserialize, Serialize};

/// `{"files": [...]}`
#[derive(Debug, Serialize)]
pub struct FilesResponse {
    pub files: Vec<String>,
}

/// Body of `POST /api/logs/is_mocked`
#[derive(Debug, Deserialize)]
pub struct IsMockedRequest {
    #[serde(rename = "full-url")]
    pub full_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct IsMockedResponse {
    pub mocked: bool,
}

/// Body of the move endpoints
#[derive(Debug, Deserialize)]
pub struct MoveRequest {
    #[serde(rename = "fileName")]
    pub file_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MoveResponse {
    pub success: bool,
    pub moved: String,
}

/// Value of a query parameter, percent-decoded.
pub fn query_param(query: Option<&str>, key: &str) -> Option<String> {
    query?.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
        if k != key {
            return None;
        }
        urlencoding::decode(&v.replace('+', " "))
            .ok()
            .map(|v| v.into_owned())
    })
}

/// Percent-decode a path segment.
pub fn decode_segment(segment: &str) -> Option<String> {
    urlencoding::decode(segment).ok().map(|s| s.into_owned())
}

/// Create a JSON response
pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    let json = serde_json::to_string_pretty(body).unwrap_or_else(|_| "{}".to_string());
    raw_json_response(status, json)
}

/// JSON response from an already-encoded payload.
pub fn raw_json_response(status: StatusCode, body: impl Into<Bytes>) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(body.into()));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, VALUE_JSON.clone());
    response
}

/// Prometheus text exposition.
pub fn metrics_response(body: String) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from(body)));
    response
        .headers_mut()
        .insert(CONTENT_TYPE, VALUE_METRICS.clone());
    response
}

/// `{"error": "<message>"}`
pub fn error_response(status: StatusCode, message: &str) -> Response<Full<Bytes>> {
    json_response(status, &serde_json::json!({ "error": message }))
}
