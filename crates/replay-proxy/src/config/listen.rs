//! Listener configuration.

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ListenConfig {
    #[serde(default = "default_listen_host")]
    pub host: IpAddr,
    #[serde(default = "default_listen_port")]
    pub port: u16,
}

impl ListenConfig {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn default_listen_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_listen_port() -> u16 {
    3000
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            host: default_listen_host(),
            port: default_listen_port(),
        }
    }
}
