//! Interaction record document shape.

use hyper::HeaderMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// One persisted request/response interaction.
///
/// Field names are the on-disk contract shared with the log viewer and with
/// hand-written mock artifacts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionRecord {
    /// Local capture time, ISO-8601
    pub timestamp: String,
    pub method: String,
    #[serde(rename = "full-url")]
    pub full_url: String,
    /// Inbound path without the leading `/`
    #[serde(default)]
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    /// Request headers keyed by lowercase name; the case the client sent is
    /// not preserved
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Parsed JSON request body, or an empty object
    #[serde(default = "empty_object")]
    pub body: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    /// Seconds between dispatch and response, rounded to 4 places
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    pub response: RecordedResponse,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedResponse {
    pub status_code: u16,
    /// Upstream headers keyed by lowercase name
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Parsed JSON when the payload is JSON, decoded text otherwise
    #[serde(default)]
    pub body: Value,
}

pub fn empty_object() -> Value {
    Value::Object(Map::new())
}

/// Decode a payload for the record: JSON if it parses, otherwise UTF-8 text
/// with replacement characters.
pub fn decode_body(bytes: &[u8]) -> Value {
    if bytes.is_empty() {
        return Value::String(String::new());
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

/// Flatten a header map into name -> value, joining repeated headers with `, `.
///
/// Names come out lowercase, as hyper stores them.
pub fn header_map_to_record(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut out: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        out.entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert(value);
    }
    out
}

/// Round an elapsed time in seconds to 4 decimal places.
pub fn round_cost(seconds: f64) -> f64 {
    (seconds * 10_000.0).round() / 10_000.0
}
