//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build the route table (storage handlers on the dispatch router)
//! - Wire up middleware (tracing, timeout, body limit, request ID,
//!   optional access log)
//! - Serve over rustls, or plain TCP for tests and local use
//! - Stop on the shutdown broadcast

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::middleware;
use axum_server::tls_rustls::RustlsConfig;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ServerConfig;
use crate::http::access_log::access_log;
use crate::http::request::{MakeRequestUuid, X_REQUEST_ID};
use crate::routing::{RouteError, Router};
use crate::storage::{self, Repository};

/// How long in-flight requests get to finish after shutdown is signalled.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP front-end for the blob store.
pub struct HttpServer {
    app: axum::Router,
    config: ServerConfig,
}

impl HttpServer {
    /// Register the storage routes for `repository` and build the service.
    ///
    /// Any registration error is returned before a socket is touched.
    pub fn new(config: ServerConfig, repository: Arc<Repository>) -> Result<Self, RouteError> {
        let mut routes = Router::new();
        storage::register_routes(&mut routes, repository, &config.resources)?;
        tracing::info!(routes = routes.len(), "Route table built");
        Ok(Self::with_router(config, routes))
    }

    /// Serve an already populated route table.
    pub fn with_router(config: ServerConfig, routes: Router) -> Self {
        let app = Self::build_app(&config, routes);
        Self { app, config }
    }

    /// Freeze the router and stack the middleware layers on it.
    ///
    /// Outermost first: access log (when configured), request ID, tracing,
    /// request ID echo, body limit, timeout. The timeout sits directly on
    /// the router.
    #[allow(deprecated)]
    fn build_app(config: &ServerConfig, routes: Router) -> axum::Router {
        let layers = ServiceBuilder::new()
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid))
            .layer(TraceLayer::new_for_http())
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(RequestBodyLimitLayer::new(config.max_upload_bytes))
            .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_secs)));

        let app = routes.into_service().layer(layers);
        if config.observability.access_log.is_some() {
            app.layer(middleware::from_fn(access_log))
        } else {
            app
        }
    }

    /// The assembled service, for in-process use.
    pub fn app(&self) -> axum::Router {
        self.app.clone()
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Serve plain HTTP on `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, tls = false, "HTTP server starting");

        axum::serve(
            listener,
            self.app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
        })
        .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Serve HTTPS on `addr` until `shutdown` fires.
    pub async fn run_tls(
        self,
        addr: SocketAddr,
        tls: RustlsConfig,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let handle = axum_server::Handle::new();
        let drain = handle.clone();
        tokio::spawn(async move {
            let _ = shutdown.recv().await;
            tracing::info!(timeout = ?DRAIN_TIMEOUT, "Draining connections");
            drain.graceful_shutdown(Some(DRAIN_TIMEOUT));
        });

        tracing::info!(address = %addr, tls = true, "HTTP server starting");
        axum_server::bind_rustls(addr, tls)
            .handle(handle)
            .serve(self.app.into_make_service_with_connect_info::<SocketAddr>())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
