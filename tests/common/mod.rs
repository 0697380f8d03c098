//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response};
use secure_rest_server::config::ServerConfig;
use secure_rest_server::lifecycle::Shutdown;
use secure_rest_server::storage::Repository;
use secure_rest_server::HttpServer;
use tokio::net::TcpListener;
use tower::ServiceExt;

/// A fresh directory under the system temp dir.
pub fn scratch_dir() -> PathBuf {
    std::env::temp_dir().join(format!("secure-rest-server-test-{}", uuid::Uuid::new_v4()))
}

/// Plain-HTTP config rooted at a scratch directory.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        listen: "127.0.0.1:0".to_string(),
        path: scratch_dir(),
        tls: false,
        ..ServerConfig::default()
    }
}

/// Initialise the repository and build the server for `config`.
pub async fn build_server(config: ServerConfig) -> HttpServer {
    let repository = Arc::new(
        Repository::new(config.path.clone(), config.append_only)
            .with_max_size(config.max_repo_size),
    );
    repository.init(&config.resources).await.unwrap();
    HttpServer::new(config, repository).unwrap()
}

/// Drive one request through the in-process service.
pub async fn send(app: &axum::Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// A server listening on an ephemeral port.
pub struct RunningServer {
    pub addr: SocketAddr,
    pub root: PathBuf,
    shutdown: Shutdown,
}

impl RunningServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn stop(self) {
        self.shutdown.trigger();
        tokio::time::sleep(Duration::from_millis(50)).await;
        let _ = tokio::fs::remove_dir_all(&self.root).await;
    }
}

/// Start a plain-HTTP server for `config` on 127.0.0.1:0.
pub async fn start_server(config: ServerConfig) -> RunningServer {
    let root = config.path.clone();
    let server = build_server(config).await;
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });

    RunningServer {
        addr,
        root,
        shutdown,
    }
}
