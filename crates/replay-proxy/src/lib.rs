//! Record/replay HTTP proxy.
//!
//! Every inbound request is either answered from a stored mock or forwarded
//! to the origin named by its `origin-host` header; both paths persist an
//! interaction record that can later be promoted into a mock.

pub mod admin_api;
pub mod backends;
pub mod config;
pub mod lifecycle;
pub mod matcher;
pub mod metrics;
pub mod proxy;
pub mod recording;
pub mod store;
