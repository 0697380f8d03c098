//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML files and
//! default every field, so an empty file is a valid configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration for the server.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address (e.g., "0.0.0.0:8000").
    pub listen: String,

    /// Data directory holding the repository.
    pub path: PathBuf,

    /// Serve over TLS. The secure server refuses to start without it.
    pub tls: bool,

    /// Certificate (PEM). Defaults to `<path>/public_key`.
    pub tls_cert: Option<PathBuf>,

    /// Private key (PEM). Defaults to `<path>/private_key`.
    pub tls_key: Option<PathBuf>,

    /// Refuse deletes (except locks) and config overwrites.
    pub append_only: bool,

    /// Largest accepted request body in bytes.
    pub max_upload_bytes: usize,

    /// Total bytes the repository's items may occupy. Unlimited when unset.
    pub max_repo_size: Option<u64>,

    /// Per-request timeout.
    pub request_timeout_secs: u64,

    /// Resource kinds exposed as `/<kind>/` and `/<kind>/:name`.
    pub resources: Vec<String>,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:8000".to_string(),
            path: std::env::temp_dir().join("restic"),
            tls: true,
            tls_cert: None,
            tls_key: None,
            append_only: false,
            max_upload_bytes: 128 * 1024 * 1024,
            max_repo_size: None,
            request_timeout_secs: 300,
            resources: default_resources(),
            observability: ObservabilityConfig::default(),
        }
    }
}

fn default_resources() -> Vec<String> {
    ["blobs", "keys", "locks", "snapshots", "index"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// Logging and metrics.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level used when `RUST_LOG` is unset.
    pub log_level: String,

    /// Force debug logging.
    pub debug: bool,

    /// Expose Prometheus metrics.
    pub metrics_enabled: bool,

    /// Metrics listener address.
    pub metrics_address: String,

    /// File receiving one combined-format line per HTTP request.
    pub access_log: Option<PathBuf>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            debug: false,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
            access_log: None,
        }
    }
}
