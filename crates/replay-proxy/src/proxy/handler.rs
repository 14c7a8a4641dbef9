//! Interaction engine: mock hit or forward, then record.
//!
//! ```text
//! request -> origin-host? --no--> 400
//!               |
//!            mock match --hit--> 200 stored body (+ synthetic record)
//!               |
//!             miss --> forward --> record --> upstream response
//! ```

use super::forwarding::{ForwardRequest, Forwarder, HttpForwarder};
use super::headers::{
    sanitize_response, CorsHeadersExt, ORIGIN_HOST, VALUE_INTERCEPTED_METHODS, VALUE_JSON,
    VALUE_PLAIN_TEXT,
};
use crate::admin_api::error_response;
use crate::config::Config;
use crate::matcher::{create_matcher, MockHit, MockMatcher};
use crate::metrics;
use crate::recording::{
    decode_body, empty_object, header_map_to_record, InteractionRecorder, KeywordSource,
    RecordOutcome, RequestInfo, ResponseInfo,
};
use crate::store::ArtifactStore;
use chrono::Local;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{ALLOW, CONTENT_TYPE};
use hyper::{HeaderMap, Method, Request, Response, StatusCode};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

const MISSING_ORIGIN_HOST: &str = "Missing origin-host header";

#[derive(Debug, thiserror::Error)]
enum EngineError {
    #[error("Missing origin-host header")]
    MissingOriginHost,
    #[error("Method {0} is not intercepted")]
    MethodNotAllowed(Method),
    #[error("mock lookup failed: {0}")]
    Lookup(#[source] tokio::task::JoinError),
}

/// Result of reading the inbound body.
///
/// Parse problems are never fatal: every variant except `Json` yields an
/// empty object for matching and recording.
#[derive(Debug, Clone, PartialEq)]
pub enum BodyParse {
    Json(Value),
    /// JSON content type with an empty payload
    Empty,
    /// Content type is not JSON
    NotJson,
    /// JSON content type but the payload did not parse
    Malformed(String),
}

impl BodyParse {
    pub fn from_request(headers: &HeaderMap, body: &[u8]) -> Self {
        if !is_json_content_type(headers) {
            return BodyParse::NotJson;
        }
        if body.iter().all(u8::is_ascii_whitespace) {
            return BodyParse::Empty;
        }
        match serde_json::from_slice(body) {
            Ok(value) => BodyParse::Json(value),
            Err(e) => BodyParse::Malformed(e.to_string()),
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            BodyParse::Json(value) => value,
            _ => empty_object(),
        }
    }
}

/// `application/json` or any `+json` media type.
pub fn is_json_content_type(headers: &HeaderMap) -> bool {
    let Some(value) = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()) else {
        return false;
    };
    let media_type = value
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    media_type == "application/json" || media_type.ends_with("+json")
}

/// Forward target and lookup key: `origin-host` joined with the inbound path
/// and query.
pub fn forward_url(origin_host: &str, path: &str, query: Option<&str>) -> String {
    let mut url = format!(
        "{}/{}",
        origin_host.trim().trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    if let Some(query) = query.filter(|q| !q.is_empty()) {
        url.push('?');
        url.push_str(query);
    }
    url
}

/// Methods the interception route answers.
pub fn intercepts(method: &Method) -> bool {
    matches!(
        *method,
        Method::GET | Method::POST | Method::PUT | Method::DELETE | Method::PATCH
    )
}

/// Decides, per request, between replaying a mock and forwarding upstream.
///
/// Holds no locks across requests; concurrent requests only share the
/// artifact store.
pub struct InteractionEngine {
    matcher: Arc<dyn MockMatcher>,
    forwarder: Arc<dyn Forwarder>,
    recorder: Arc<InteractionRecorder>,
    record_mock_hits: bool,
}

impl InteractionEngine {
    pub fn new(
        matcher: Arc<dyn MockMatcher>,
        forwarder: Arc<dyn Forwarder>,
        recorder: InteractionRecorder,
        record_mock_hits: bool,
    ) -> Self {
        Self {
            matcher,
            forwarder,
            recorder: Arc::new(recorder),
            record_mock_hits,
        }
    }

    /// Wire the engine from configuration over an existing store.
    pub fn from_config(config: &Config, store: Arc<dyn ArtifactStore>) -> anyhow::Result<Self> {
        let matcher = create_matcher(config.matching.strategy, store.clone());
        let forwarder = Arc::new(HttpForwarder::from_config(&config.upstream)?);
        let keywords = match &config.recording.keyword_map {
            Some(path) => KeywordSource::File(path.clone()),
            None => KeywordSource::Disabled,
        };
        info!(
            "Interaction engine: matcher={}, record_mock_hits={}",
            matcher.name(),
            config.recording.record_mock_hits
        );
        Ok(Self::new(
            matcher,
            forwarder,
            InteractionRecorder::new(store, keywords),
            config.recording.record_mock_hits,
        ))
    }

    /// Handle one request. Never fails: every error becomes a JSON response,
    /// and every response allows any origin.
    pub async fn handle(&self, request: Request<Bytes>) -> Response<Full<Bytes>> {
        let method = request.method().to_string();
        let mut response = match self.dispatch(request).await {
            Ok(response) => response,
            Err(EngineError::MissingOriginHost) => {
                debug!("Rejecting {} without origin-host", method);
                metrics::record_request(&method, 400, "rejected");
                error_response(StatusCode::BAD_REQUEST, MISSING_ORIGIN_HOST)
            }
            Err(e @ EngineError::MethodNotAllowed(_)) => {
                debug!("{}", e);
                metrics::record_request(&method, 405, "rejected");
                let mut response = error_response(StatusCode::METHOD_NOT_ALLOWED, &e.to_string());
                response
                    .headers_mut()
                    .insert(ALLOW, VALUE_INTERCEPTED_METHODS.clone());
                response
            }
            Err(e) => {
                error!("Failed to handle {} request: {}", method, e);
                metrics::record_request(&method, 500, "error");
                error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
            }
        };
        response.allow_any_origin();
        response
    }

    async fn dispatch(&self, request: Request<Bytes>) -> Result<Response<Full<Bytes>>, EngineError> {
        if !intercepts(request.method()) {
            return Err(EngineError::MethodNotAllowed(request.method().clone()));
        }
        let started_at = Local::now();
        let (parts, body) = request.into_parts();

        let parsed = BodyParse::from_request(&parts.headers, &body);
        if let BodyParse::Malformed(reason) = &parsed {
            debug!("Treating malformed JSON body as empty: {}", reason);
        }
        let json_body = parsed.into_value();

        let origin_host = parts
            .headers
            .get(&ORIGIN_HOST)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or(EngineError::MissingOriginHost)?;

        let url = forward_url(origin_host, parts.uri.path(), parts.uri.query());
        let info = RequestInfo {
            started_at,
            method: parts.method.to_string(),
            full_url: url.clone(),
            path: parts.uri.path().to_string(),
            query: parts.uri.query().map(str::to_string),
            headers: header_map_to_record(&parts.headers),
            body: json_body.clone(),
        };

        if let Some(hit) = self.lookup(&url, &json_body).await? {
            return Ok(self.replay(info, hit).await);
        }

        let forward = ForwardRequest::new(parts.method, url, parts.headers, body);
        Ok(self.forward(info, forward).await)
    }

    async fn lookup(&self, url: &str, body: &Value) -> Result<Option<MockHit>, EngineError> {
        let matcher = Arc::clone(&self.matcher);
        let url = url.to_string();
        let body = body.clone();
        tokio::task::spawn_blocking(move || matcher.find(&url, &body))
            .await
            .map_err(EngineError::Lookup)
    }

    async fn replay(&self, info: RequestInfo, hit: MockHit) -> Response<Full<Bytes>> {
        debug!("Mock hit for {} {}: {}", info.method, info.full_url, hit.artifact);
        metrics::record_request(&info.method, 200, "mock");

        let body = Bytes::from(hit.body);
        if self.record_mock_hits {
            let headers = BTreeMap::from([(
                CONTENT_TYPE.as_str().to_string(),
                "application/json".to_string(),
            )]);
            let response = ResponseInfo {
                status_code: StatusCode::OK.as_u16(),
                headers,
                body: decode_body(&body),
                elapsed: None,
            };
            self.record(info, response).await;
        }

        let mut response = Response::new(Full::new(body));
        response
            .headers_mut()
            .insert(CONTENT_TYPE, VALUE_JSON.clone());
        response
    }

    async fn forward(&self, info: RequestInfo, request: ForwardRequest) -> Response<Full<Bytes>> {
        let dispatched = Instant::now();
        match self.forwarder.forward(request).await {
            Ok(upstream) => {
                let mut headers = upstream.headers;
                sanitize_response(&mut headers);
                metrics::record_request(&info.method, upstream.status.as_u16(), "forward");

                let recorded = ResponseInfo {
                    status_code: upstream.status.as_u16(),
                    headers: header_map_to_record(&headers),
                    body: decode_body(&upstream.body),
                    elapsed: Some(upstream.elapsed),
                };
                self.record(info, recorded).await;

                let mut response = Response::new(Full::new(upstream.body));
                *response.status_mut() = upstream.status;
                *response.headers_mut() = headers;
                response
            }
            Err(e) => {
                let message = e.describe();
                error!("Forward {} {} failed: {}", info.method, info.full_url, message);
                metrics::record_request(&info.method, 500, "error");

                let recorded = ResponseInfo {
                    status_code: StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
                    headers: BTreeMap::new(),
                    body: Value::String(message.clone()),
                    elapsed: Some(dispatched.elapsed()),
                };
                self.record(info, recorded).await;

                let mut response =
                    Response::new(Full::new(Bytes::from(format!("forward failed: {message}"))));
                *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
                response
                    .headers_mut()
                    .insert(CONTENT_TYPE, VALUE_PLAIN_TEXT.clone());
                response
            }
        }
    }

    /// Persist off the async workers. Failures stop here.
    async fn record(&self, request: RequestInfo, response: ResponseInfo) -> RecordOutcome {
        let recorder = Arc::clone(&self.recorder);
        match tokio::task::spawn_blocking(move || recorder.record(&request, response)).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Recording task failed: {}", e);
                RecordOutcome::Failed
            }
        }
    }
}
