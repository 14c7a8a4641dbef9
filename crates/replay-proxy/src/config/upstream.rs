//! Outbound client configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpstreamConfig {
    /// Upper bound for a whole forward: connect, send and read the body
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Skip TLS certificate verification (for self-signed certs in dev/test)
    #[serde(default)]
    pub tls_skip_verify: bool,

    #[serde(default)]
    pub connection_pool: ConnectionPoolConfig,
}

impl UpstreamConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout(),
            tls_skip_verify: false,
            connection_pool: ConnectionPoolConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConnectionPoolConfig {
    #[serde(default = "default_pool_max_idle_per_host")]
    pub max_idle_per_host: usize,

    #[serde(default = "default_pool_idle_timeout")]
    pub idle_timeout_secs: u64,

    #[serde(default = "default_keepalive_timeout")]
    pub keepalive_timeout_secs: u64,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

impl Default for ConnectionPoolConfig {
    fn default() -> Self {
        Self {
            max_idle_per_host: default_pool_max_idle_per_host(),
            idle_timeout_secs: default_pool_idle_timeout(),
            keepalive_timeout_secs: default_keepalive_timeout(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

fn default_pool_max_idle_per_host() -> usize {
    32
}

fn default_pool_idle_timeout() -> u64 {
    90
}

fn default_keepalive_timeout() -> u64 {
    60
}

fn default_connect_timeout() -> u64 {
    10
}
