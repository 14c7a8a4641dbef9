//! ProxyServer struct and main run loop.
//!
//! Accepts connections, reads each request body in full, then dispatches to
//! the lifecycle API or the interaction engine.

use super::handler::InteractionEngine;
use super::headers::CorsHeadersExt;
use crate::admin_api::{error_response, AdminApi, AdminRoute};
use crate::config::Config;
use crate::store::{create_store, ArtifactStore};
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

/// The main proxy server struct.
pub struct ProxyServer {
    addr: SocketAddr,
    engine: Arc<InteractionEngine>,
    admin: Arc<AdminApi>,
}

impl ProxyServer {
    /// Create a server backed by the configured filesystem store.
    pub fn new(config: &Config) -> Result<Self, anyhow::Error> {
        let store = create_store(&config.storage)?;
        Self::with_store(config, store)
    }

    /// Create a server over an existing store.
    pub fn with_store(config: &Config, store: Arc<dyn ArtifactStore>) -> Result<Self, anyhow::Error> {
        let engine = InteractionEngine::from_config(config, store.clone())?;
        Ok(Self::from_parts(config.listen.socket_addr(), engine, AdminApi::new(store)))
    }

    pub fn from_parts(addr: SocketAddr, engine: InteractionEngine, admin: AdminApi) -> Self {
        Self {
            addr,
            engine: Arc::new(engine),
            admin: Arc::new(admin),
        }
    }

    /// Bind the configured address and serve until the task is dropped.
    pub async fn run(self) -> Result<(), anyhow::Error> {
        let listener = TcpListener::bind(self.addr)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind {}: {e}", self.addr))?;
        self.serve(listener).await
    }

    /// Serve connections from an already-bound listener.
    pub async fn serve(self, listener: TcpListener) -> Result<(), anyhow::Error> {
        info!("Listening on http://{}", listener.local_addr()?);

        let server = Arc::new(self);
        loop {
            let (stream, remote_addr) = listener.accept().await?;
            let server = Arc::clone(&server);

            tokio::spawn(async move {
                let io = TokioIo::new(stream);
                let service = service_fn(move |req| {
                    let server = Arc::clone(&server);
                    async move { server.handle_request(req).await }
                });

                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    error!("Error serving connection from {}: {}", remote_addr, err);
                }
            });
        }
    }

    async fn handle_request(
        &self,
        req: Request<Incoming>,
    ) -> Result<Response<Full<Bytes>>, Infallible> {
        let (parts, body) = req.into_parts();
        debug!("Received request: {} {}", parts.method, parts.uri);

        let mut response = match body.collect().await {
            Ok(collected) => {
                let request = Request::from_parts(parts, collected.to_bytes());
                self.dispatch(request).await
            }
            Err(e) => {
                error!("Failed to read request body: {}", e);
                error_response(StatusCode::BAD_REQUEST, "Failed to read request body")
            }
        };
        response.allow_any_origin();
        Ok(response)
    }

    async fn dispatch(&self, request: Request<Bytes>) -> Response<Full<Bytes>> {
        if request.method() == Method::OPTIONS {
            let mut response = Response::new(Full::new(Bytes::new()));
            *response.status_mut() = StatusCode::NO_CONTENT;
            response.allow_preflight();
            return response;
        }

        let Some(route) = AdminRoute::parse(request.method(), request.uri().path()) else {
            return self.engine.handle(request).await;
        };

        let admin = Arc::clone(&self.admin);
        let query = request.uri().query().map(str::to_string);
        let body = request.into_body();
        match tokio::task::spawn_blocking(move || admin.handle(&route, query.as_deref(), &body)).await
        {
            Ok(response) => response,
            Err(e) => {
                error!("Lifecycle request failed: {}", e);
                error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
            }
        }
    }
}
