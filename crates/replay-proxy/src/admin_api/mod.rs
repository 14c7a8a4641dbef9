//! Lifecycle REST API for recorded interactions.
//!
//! Served on the proxy's own listener:
//! - Listing and fetching log and mock artifacts
//! - Bulk deletion of logs
//! - Promotion (log -> mock) and demotion (mock -> log)
//! - Is-mocked query
//! - Health and metrics endpoints

mod handlers;
mod router;
mod types;

pub use router::{AdminApi, AdminRoute};
pub use types::error_response;
