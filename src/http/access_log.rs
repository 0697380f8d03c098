//! Access log in the combined log format.
//!
//! One event per request on the [`ACCESS_LOG_TARGET`] target. The logging
//! setup sends that target to the configured file and keeps it off stdout;
//! the timestamp comes from the log line prefix.

use std::fmt;
use std::net::SocketAddr;

use axum::body::HttpBody;
use axum::extract::{ConnectInfo, Request};
use axum::http::{header, HeaderMap, HeaderName};
use axum::middleware::Next;
use axum::response::Response;

/// Tracing target of access-log events.
pub const ACCESS_LOG_TARGET: &str = "access_log";

/// One request as it appears in the access log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessEntry {
    pub remote: Option<SocketAddr>,
    pub method: String,
    pub uri: String,
    pub version: String,
    pub status: u16,
    pub size: Option<u64>,
    pub referer: Option<String>,
    pub user_agent: Option<String>,
}

impl fmt::Display for AccessEntry {
    /// `host - - "METHOD uri VERSION" status size "referer" "agent"`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.remote {
            Some(addr) => write!(f, "{}", addr.ip())?,
            None => f.write_str("-")?,
        }
        write!(
            f,
            " - - \"{} {} {}\" {} ",
            self.method, self.uri, self.version, self.status
        )?;
        match self.size {
            Some(size) => write!(f, "{size}")?,
            None => f.write_str("-")?,
        }
        write!(
            f,
            " \"{}\" \"{}\"",
            self.referer.as_deref().unwrap_or("-"),
            self.user_agent.as_deref().unwrap_or("-")
        )
    }
}

/// Middleware writing one access-log line per request.
pub async fn access_log(request: Request, next: Next) -> Response {
    let remote = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let method = request.method().to_string();
    let uri = request.uri().to_string();
    let version = format!("{:?}", request.version());
    let referer = header_text(request.headers(), &header::REFERER);
    let user_agent = header_text(request.headers(), &header::USER_AGENT);

    let response = next.run(request).await;

    let size = header_text(response.headers(), &header::CONTENT_LENGTH)
        .and_then(|len| len.parse().ok())
        .or_else(|| response.body().size_hint().exact());

    let entry = AccessEntry {
        remote,
        method,
        uri,
        version,
        status: response.status().as_u16(),
        size,
        referer,
        user_agent,
    };
    tracing::info!(target: ACCESS_LOG_TARGET, "{entry}");
    response
}

fn header_text(headers: &HeaderMap, name: &HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
}
