//! HTTP client creation and configuration.
//!
//! One pooled client is shared by every forwarded request.

use super::tls::unverified_origin_config;
use crate::config::UpstreamConfig;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use std::time::Duration;
use tracing::{info, warn};

/// Type alias for the HTTP client used for upstream calls.
pub type HttpClient = Client<hyper_rustls::HttpsConnector<HttpConnector>, Full<Bytes>>;

/// Create the shared upstream client with connection pooling.
///
/// Both `http://` and `https://` origins are accepted; only HTTP/1.1 is spoken.
pub fn create_http_client(config: &UpstreamConfig) -> anyhow::Result<HttpClient> {
    let pool = &config.connection_pool;

    let mut http_connector = HttpConnector::new();
    http_connector.set_keepalive(Some(Duration::from_secs(pool.keepalive_timeout_secs)));
    http_connector.set_connect_timeout(Some(Duration::from_secs(pool.connect_timeout_secs)));
    http_connector.enforce_http(false);

    let https_connector = if config.tls_skip_verify {
        warn!("TLS certificate verification DISABLED for upstream calls (development/testing only)");
        hyper_rustls::HttpsConnectorBuilder::new()
            .with_tls_config(unverified_origin_config()?)
            .https_or_http()
            .enable_http1()
            .wrap_connector(http_connector)
    } else {
        hyper_rustls::HttpsConnectorBuilder::new()
            .with_native_roots()
            .map_err(|e| anyhow::anyhow!("Failed to load native root certificates: {e}"))?
            .https_or_http()
            .enable_http1()
            .wrap_connector(http_connector)
    };

    let http_client = Client::builder(TokioExecutor::new())
        .pool_idle_timeout(Duration::from_secs(pool.idle_timeout_secs))
        .pool_max_idle_per_host(pool.max_idle_per_host)
        .build(https_connector);

    info!(
        "Upstream client configured (HTTP/1.1): max_idle={}, idle_timeout={}s, connect_timeout={}s, request_timeout={}s",
        pool.max_idle_per_host,
        pool.idle_timeout_secs,
        pool.connect_timeout_secs,
        config.request_timeout_secs
    );

    Ok(http_client)
}
