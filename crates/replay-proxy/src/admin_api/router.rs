//! Route dispatch for the lifecycle API.
//!
//! Lifecycle routes share the listener with the interception route; anything
//! [`AdminRoute::parse`] does not claim falls through to the engine.

use crate::admin_api::handlers::{logs, system};
use crate::lifecycle::LifecycleService;
use crate::store::{ArtifactStore, Collection};
use bytes::Bytes;
use http_body_util::Full;
use hyper::{Method, Response};
use std::sync::Arc;
use tracing::debug;

/// A lifecycle endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminRoute {
    /// GET /api/health
    Health,
    /// GET /api/metrics
    Metrics,
    /// GET /api/logs/files
    ListLogs,
    /// GET /api/mocks/files
    ListMocks,
    /// GET /logs/:filename
    FetchLog(String),
    /// GET /mocks/:filename
    FetchMock(String),
    /// POST /api/logs/is_mocked
    IsMocked,
    /// POST /api/logs/delete_all
    DeleteAllLogs,
    /// POST /api/logs/move_to_mocked
    MoveToMocked,
    /// POST /api/logs/move_to_logs
    MoveToLogs,
}

impl AdminRoute {
    pub fn parse(method: &Method, path: &str) -> Option<Self> {
        match (method, path) {
            (&Method::GET, "/api/health") => return Some(AdminRoute::Health),
            (&Method::GET, "/api/metrics") => return Some(AdminRoute::Metrics),
            (&Method::GET, "/api/logs/files") => return Some(AdminRoute::ListLogs),
            (&Method::GET, "/api/mocks/files") => return Some(AdminRoute::ListMocks),
            (&Method::POST, "/api/logs/is_mocked") => return Some(AdminRoute::IsMocked),
            (&Method::POST, "/api/logs/delete_all") => return Some(AdminRoute::DeleteAllLogs),
            (&Method::POST, "/api/logs/move_to_mocked") => return Some(AdminRoute::MoveToMocked),
            (&Method::POST, "/api/logs/move_to_logs") => return Some(AdminRoute::MoveToLogs),
            _ => {}
        }

        if method != Method::GET {
            return None;
        }
        if let Some(name) = path.strip_prefix("/logs/").filter(|n| !n.is_empty()) {
            return Some(AdminRoute::FetchLog(name.to_string()));
        }
        if let Some(name) = path.strip_prefix("/mocks/").filter(|n| !n.is_empty()) {
            return Some(AdminRoute::FetchMock(name.to_string()));
        }
        None
    }
}

/// Lifecycle API over the shared artifact store.
pub struct AdminApi {
    service: LifecycleService,
}

impl AdminApi {
    pub fn new(store: Arc<dyn ArtifactStore>) -> Self {
        Self {
            service: LifecycleService::new(store),
        }
    }

    /// Serve a parsed route. Store access is blocking; call from a blocking
    /// context.
    pub fn handle(&self, route: &AdminRoute, query: Option<&str>, body: &Bytes) -> Response<Full<Bytes>> {
        debug!("Lifecycle API: {:?}", route);
        match route {
            AdminRoute::Health => system::handle_health(),
            AdminRoute::Metrics => system::handle_metrics(),
            AdminRoute::ListLogs => logs::handle_list_logs(&self.service, query),
            AdminRoute::ListMocks => logs::handle_list_mocks(&self.service),
            AdminRoute::FetchLog(name) => logs::handle_fetch(&self.service, Collection::Log, name),
            AdminRoute::FetchMock(name) => {
                logs::handle_fetch(&self.service, Collection::Mock, name)
            }
            AdminRoute::IsMocked => logs::handle_is_mocked(&self.service, body),
            AdminRoute::DeleteAllLogs => logs::handle_delete_all(&self.service),
            AdminRoute::MoveToMocked => logs::handle_move(&self.service, Collection::Mock, body),
            AdminRoute::MoveToLogs => logs::handle_move(&self.service, Collection::Log, body),
        }
    }
}
