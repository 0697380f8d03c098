//! Secure REST server (v1)
//!
//! Serves a restic-style REST API over TLS.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ net (rustls) ──▶ [auth gate] ──▶ http (layers) ──▶ routing ──▶ storage
//!                                                                         │            │
//!                                                                    404 / 405      data dir
//!
//!     Cross-cutting: config, observability, lifecycle
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use secure_rest_server::config::{load_config, tls_settings, validate_config, ConfigError, ServerConfig};
use secure_rest_server::lifecycle::{wait_for_signal, Shutdown};
use secure_rest_server::net::load_tls_config;
use secure_rest_server::observability::{logging, metrics};
use secure_rest_server::storage::Repository;
use secure_rest_server::HttpServer;

#[derive(Parser, Debug)]
#[command(name = "secure-rest-server")]
#[command(version, about = "Run a TLS REST server for use with restic", long_about = None)]
struct Cli {
    /// TOML configuration file; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Listen address
    #[arg(long)]
    listen: Option<String>,

    /// Data directory
    #[arg(long)]
    path: Option<PathBuf>,

    /// Turn on TLS support
    #[arg(long, overrides_with = "no_tls")]
    tls: bool,

    /// Turn off TLS support (the server then refuses to start)
    #[arg(long, overrides_with = "tls")]
    no_tls: bool,

    /// TLS certificate path
    #[arg(long)]
    tls_cert: Option<PathBuf>,

    /// TLS key path
    #[arg(long)]
    tls_key: Option<PathBuf>,

    /// Enable append only mode
    #[arg(long)]
    append_only: bool,

    /// Maximum size of the repository in bytes
    #[arg(long)]
    max_size: Option<u64>,

    /// Maximum request body size in bytes
    #[arg(long)]
    max_upload_bytes: Option<usize>,

    /// Write HTTP requests in the combined log format to this file
    #[arg(long, value_name = "FILENAME")]
    log: Option<PathBuf>,

    /// Output debug messages
    #[arg(long)]
    debug: bool,

    /// Enable Prometheus metrics
    #[arg(long)]
    prometheus: bool,
}

impl Cli {
    fn apply(&self, config: &mut ServerConfig) {
        if let Some(listen) = &self.listen {
            config.listen = listen.clone();
        }
        if let Some(path) = &self.path {
            config.path = path.clone();
        }
        if self.no_tls {
            config.tls = false;
        } else if self.tls {
            config.tls = true;
        }
        if let Some(cert) = &self.tls_cert {
            config.tls_cert = Some(cert.clone());
        }
        if let Some(key) = &self.tls_key {
            config.tls_key = Some(key.clone());
        }
        if let Some(max_size) = self.max_size {
            config.max_repo_size = Some(max_size);
        }
        if let Some(max_upload_bytes) = self.max_upload_bytes {
            config.max_upload_bytes = max_upload_bytes;
        }
        if let Some(log) = &self.log {
            config.observability.access_log = Some(log.clone());
        }
        config.append_only |= self.append_only;
        config.observability.debug |= self.debug;
        config.observability.metrics_enabled |= self.prometheus;
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };
    cli.apply(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;

    let _access_log = logging::init_tracing(&config.observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "secure-rest-server starting");
    tracing::info!(
        path = %config.path.display(),
        listen = %config.listen,
        append_only = config.append_only,
        max_size = ?config.max_repo_size,
        access_log = ?config.observability.access_log,
        "Configuration loaded"
    );

    let Some(tls_paths) = tls_settings(&config)? else {
        return Err("secure server doesn't work without TLS".into());
    };
    let addr: SocketAddr = config.listen.parse()?;

    if config.observability.metrics_enabled {
        metrics::init_metrics(config.observability.metrics_address.parse()?)?;
    }

    let repository = Arc::new(
        Repository::new(config.path.clone(), config.append_only)
            .with_max_size(config.max_repo_size),
    );
    repository.init(&config.resources).await?;

    let server = HttpServer::new(config, repository)?;
    let tls = load_tls_config(&tls_paths).await?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        match wait_for_signal().await {
            Ok(_) => {
                signal_shutdown.trigger();
            }
            Err(e) => tracing::error!(error = %e, "Failed to install signal handlers"),
        }
    });

    server.run_tls(addr, tls, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
