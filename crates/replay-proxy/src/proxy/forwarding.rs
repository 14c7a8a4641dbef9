//! Request forwarding to the declared origin.
//!
//! The engine only sees the [`Forwarder`] trait; [`HttpForwarder`] is the
//! hyper-based implementation used by the server.

use super::client::{create_http_client, HttpClient};
use super::headers::{sanitize_outbound, strip_framing};
use crate::config::UpstreamConfig;
use crate::metrics;
use async_trait::async_trait;
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::{HeaderMap, Method, Request, StatusCode, Uri};
use std::error::Error as _;
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum ForwardError {
    #[error("invalid upstream url '{url}': {source}")]
    InvalidUri {
        url: String,
        source: hyper::http::uri::InvalidUri,
    },
    #[error("failed to build upstream request: {0}")]
    Request(#[from] hyper::http::Error),
    #[error("upstream request failed: {0}")]
    Transport(#[source] hyper_util::client::legacy::Error),
    #[error("failed to read upstream response body: {0}")]
    Body(#[source] hyper::Error),
    #[error("upstream did not respond within {0:?}")]
    Timeout(Duration),
}

impl ForwardError {
    /// Message including every underlying cause, e.g. the refused connection
    /// behind a generic client error.
    pub fn describe(&self) -> String {
        let mut message = self.to_string();
        let mut source = self.source().and_then(|s| s.source());
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        message
    }
}

/// Outbound request, already sanitized.
#[derive(Debug, Clone)]
pub struct ForwardRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl ForwardRequest {
    /// Build the outbound request from inbound parts.
    ///
    /// Only POST, PUT and PATCH carry the body; for every other method the body
    /// and its framing headers are dropped.
    pub fn new(method: Method, url: impl Into<String>, mut headers: HeaderMap, body: Bytes) -> Self {
        sanitize_outbound(&mut headers);
        let body = if carries_body(&method) {
            body
        } else {
            strip_framing(&mut headers);
            Bytes::new()
        };
        Self {
            method,
            url: url.into(),
            headers,
            body,
        }
    }
}

pub fn carries_body(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH)
}

/// Upstream response with the payload fully read.
#[derive(Debug, Clone)]
pub struct ForwardedResponse {
    pub status: StatusCode,
    /// Headers as returned by the origin, not yet sanitized
    pub headers: HeaderMap,
    pub body: Bytes,
    /// Dispatch until the last body byte arrived
    pub elapsed: Duration,
}

#[async_trait]
pub trait Forwarder: Send + Sync {
    async fn forward(&self, request: ForwardRequest) -> Result<ForwardedResponse, ForwardError>;
}

/// Forwards over the shared pooled hyper client with a bounded timeout.
pub struct HttpForwarder {
    client: HttpClient,
    timeout: Duration,
}

impl HttpForwarder {
    pub fn new(client: HttpClient, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    pub fn from_config(config: &UpstreamConfig) -> anyhow::Result<Self> {
        Ok(Self::new(create_http_client(config)?, config.request_timeout()))
    }
}

#[async_trait]
impl Forwarder for HttpForwarder {
    async fn forward(&self, request: ForwardRequest) -> Result<ForwardedResponse, ForwardError> {
        let uri: Uri = request
            .url
            .parse()
            .map_err(|source| ForwardError::InvalidUri {
                url: request.url.clone(),
                source,
            })?;

        debug!("Forwarding {} {}", request.method, uri);

        let mut builder = Request::builder().method(request.method.clone()).uri(uri);
        if let Some(headers) = builder.headers_mut() {
            *headers = request.headers;
        }
        let upstream_req = builder.body(Full::new(request.body))?;

        let started = Instant::now();
        let exchange = async {
            let response = self
                .client
                .request(upstream_req)
                .await
                .map_err(ForwardError::Transport)?;
            let (parts, body) = response.into_parts();
            let body = body.collect().await.map_err(ForwardError::Body)?.to_bytes();
            Ok::<_, ForwardError>((parts, body))
        };
        let (parts, body) = tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| ForwardError::Timeout(self.timeout))??;
        let elapsed = started.elapsed();

        metrics::record_forward_duration(request.method.as_str(), elapsed.as_secs_f64() * 1000.0);
        debug!(
            "Upstream answered {} in {:.1}ms",
            parts.status,
            elapsed.as_secs_f64() * 1000.0
        );

        Ok(ForwardedResponse {
            status: parts.status,
            headers: parts.headers,
            body,
            elapsed,
        })
    }
}
