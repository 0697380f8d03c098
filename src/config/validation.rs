//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses and value ranges
//! - Resolve TLS certificate and key locations
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

use crate::config::schema::ServerConfig;
use crate::storage::is_valid_name;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid listen address {0:?}")]
    ListenAddress(String),

    #[error("data directory must not be empty")]
    EmptyPath,

    #[error("TLS certificate or key given, but requires enabled TLS")]
    TlsDisabled,

    #[error("max_upload_bytes must be greater than zero")]
    ZeroUploadLimit,

    #[error("request_timeout_secs must be greater than zero")]
    ZeroTimeout,

    #[error("invalid resource kind {0:?}")]
    ResourceKind(String),

    #[error("duplicate resource kind {0:?}")]
    DuplicateResource(String),

    #[error("invalid metrics address {0:?}")]
    MetricsAddress(String),

    #[error("max_repo_size must be greater than zero")]
    ZeroRepoSize,

    #[error("access log {0:?} must name a file")]
    AccessLogPath(PathBuf),
}

/// Certificate and key locations for the TLS listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

/// Validate the whole configuration, collecting every problem.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listen.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::ListenAddress(config.listen.clone()));
    }
    if config.path.as_os_str().is_empty() {
        errors.push(ValidationError::EmptyPath);
    }
    if let Err(e) = tls_settings(config) {
        errors.push(e);
    }
    if config.max_upload_bytes == 0 {
        errors.push(ValidationError::ZeroUploadLimit);
    }
    if config.request_timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }
    if config.max_repo_size == Some(0) {
        errors.push(ValidationError::ZeroRepoSize);
    }

    let mut seen = HashSet::new();
    for kind in &config.resources {
        if !is_valid_name(kind) || kind == "config" {
            errors.push(ValidationError::ResourceKind(kind.clone()));
        } else if !seen.insert(kind.as_str()) {
            errors.push(ValidationError::DuplicateResource(kind.clone()));
        }
    }

    let observability = &config.observability;
    if observability.metrics_enabled
        && observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            observability.metrics_address.clone(),
        ));
    }
    if let Some(access_log) = &observability.access_log {
        if access_log.file_name().is_none() {
            errors.push(ValidationError::AccessLogPath(access_log.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Resolve where the TLS certificate and key live.
///
/// `Ok(None)` means TLS is off. Explicit paths win; otherwise both files
/// are expected inside the data directory.
pub fn tls_settings(config: &ServerConfig) -> Result<Option<TlsPaths>, ValidationError> {
    if !config.tls {
        if config.tls_cert.is_some() || config.tls_key.is_some() {
            return Err(ValidationError::TlsDisabled);
        }
        return Ok(None);
    }

    let cert = config
        .tls_cert
        .clone()
        .unwrap_or_else(|| config.path.join("public_key"));
    let key = config
        .tls_key
        .clone()
        .unwrap_or_else(|| config.path.join("private_key"));

    Ok(Some(TlsPaths { cert, key }))
}
