//! Metrics collection and exposition.
//!
//! # Metrics
//! - `rest_dispatch_total` (counter): dispatch outcomes by method
//! - `rest_handler_duration_seconds` (histogram): handler latency by
//!   method and matched pattern
//!
//! # Design Decisions
//! - Labels use the route pattern, never the raw path (bounded cardinality)
//! - Methods outside the standard set are counted as `OTHER`
//! - Without an installed recorder the macros are no-ops

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape listener.
///
/// Must run inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Prometheus metrics endpoint started");
    Ok(())
}

/// Label value for `method`: the standard methods as-is, `OTHER` otherwise.
///
/// Clients choose the method token, so it cannot be used as a label raw.
pub fn method_label(method: &str) -> &'static str {
    match method {
        "GET" => "GET",
        "HEAD" => "HEAD",
        "POST" => "POST",
        "PUT" => "PUT",
        "DELETE" => "DELETE",
        "PATCH" => "PATCH",
        "OPTIONS" => "OPTIONS",
        "CONNECT" => "CONNECT",
        "TRACE" => "TRACE",
        _ => "OTHER",
    }
}

/// Count one dispatch decision.
pub fn record_dispatch(method: &str, outcome: &'static str) {
    ::metrics::counter!(
        "rest_dispatch_total",
        "method" => method_label(method),
        "outcome" => outcome
    )
    .increment(1);
}

/// Record how long a matched handler took.
pub fn record_handler(method: &str, pattern: &str, start: Instant) {
    ::metrics::histogram!(
        "rest_handler_duration_seconds",
        "method" => method_label(method),
        "pattern" => pattern.to_owned()
    )
    .record(start.elapsed().as_secs_f64());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_label_keeps_standard_methods() {
        for method in ["GET", "HEAD", "POST", "PUT", "DELETE", "PATCH", "OPTIONS"] {
            assert_eq!(method_label(method), method);
        }
    }

    #[test]
    fn test_method_label_collapses_custom_methods() {
        assert_eq!(method_label("PROPFIND"), "OTHER");
        assert_eq!(method_label("X-RANDOM-1234"), "OTHER");
        assert_eq!(method_label("get"), "OTHER");
    }
}
