//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber once at startup
//! - Honour `RUST_LOG` when set, else the configured level
//! - Route access-log events to their own file when one is configured
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - `debug = true` forces debug level for this crate and tower-http
//! - Access-log lines are written by a non-blocking appender and never
//!   reach stdout

use std::io;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::{filter_fn, FilterExt};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::schema::ObservabilityConfig;
use crate::http::access_log::ACCESS_LOG_TARGET;

/// Filter directive derived from the configuration.
pub fn default_directive(config: &ObservabilityConfig) -> String {
    let level = if config.debug { "debug" } else { config.log_level.as_str() };
    format!("secure_rest_server={level},tower_http={level}")
}

/// Install the global subscriber.
///
/// With an access log configured, the returned guard flushes it on drop
/// and must be held until shutdown.
pub fn init_tracing(config: &ObservabilityConfig) -> io::Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(config)));
    let stdout = tracing_subscriber::fmt::layer()
        .with_filter(filter.and(filter_fn(|meta| meta.target() != ACCESS_LOG_TARGET)));

    let Some(path) = &config.access_log else {
        tracing_subscriber::registry().with(stdout).init();
        return Ok(None);
    };

    let (writer, guard) = tracing_appender::non_blocking(access_log_appender(path)?);
    let access = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(false)
        .with_level(false)
        .with_filter(filter_fn(|meta| meta.target() == ACCESS_LOG_TARGET));

    tracing_subscriber::registry().with(stdout).with(access).init();
    Ok(Some(guard))
}

/// Appender for `path`, creating its directory if needed. Lines are appended.
fn access_log_appender(path: &Path) -> io::Result<RollingFileAppender> {
    let file_name = path.file_name().ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "access log path has no file name")
    })?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name.to_string_lossy())
        .build(dir)
        .map_err(io::Error::other)
}
