//! Proxy server module.
//!
//! This module provides the interception side of the proxy:
//! - Mock replay from the mock collection
//! - Forwarding to the declared `origin-host`
//! - Recording of every interaction
//!
//! # Module Structure
//!
//! - `server` - ProxyServer struct and main run loop
//! - `handler` - Interaction engine (mock hit vs. forward)
//! - `forwarding` - Forwarder trait and the hyper-based implementation
//! - `headers` - Header names and sanitization
//! - `client` - HTTP client creation and configuration
//! - `tls` - Certificate verifier for `tls_skip_verify`

mod client;
mod forwarding;
mod handler;
pub(crate) mod headers;
mod server;
mod tls;

pub use client::{create_http_client, HttpClient};
pub use forwarding::{
    carries_body, ForwardError, ForwardRequest, ForwardedResponse, Forwarder, HttpForwarder,
};
pub use handler::{forward_url, intercepts, is_json_content_type, BodyParse, InteractionEngine};
pub use headers::{sanitize_outbound, sanitize_response, ORIGIN_HOST};
pub use server::ProxyServer;
