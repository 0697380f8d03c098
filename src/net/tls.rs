//! TLS certificate loading.

use std::io::{Error, ErrorKind};
use std::path::Path;

use axum_server::tls_rustls::RustlsConfig;

use crate::config::TlsPaths;

/// Load the PEM certificate chain and private key for the listener.
///
/// Missing files are reported by name before rustls sees them. Client
/// certificates are checked by the authentication gate in front of the
/// router, not here.
pub async fn load_tls_config(paths: &TlsPaths) -> Result<RustlsConfig, Error> {
    for (what, path) in [("certificate", &paths.cert), ("private key", &paths.key)] {
        ensure_file(what, path)?;
    }

    let config = RustlsConfig::from_pem_file(&paths.cert, &paths.key).await?;
    tracing::info!(
        cert = %paths.cert.display(),
        key = %paths.key.display(),
        "TLS enabled"
    );
    Ok(config)
}

fn ensure_file(what: &str, path: &Path) -> Result<(), Error> {
    if path.is_file() {
        return Ok(());
    }
    Err(Error::new(
        ErrorKind::NotFound,
        format!("TLS {what} not found: {}", path.display()),
    ))
}
