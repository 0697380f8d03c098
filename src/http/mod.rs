//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (axum/axum-server, middleware stack)
//!     → access_log.rs (combined-format line per request, optional)
//!     → request.rs (x-request-id)
//!     → routing::Router (dispatch by method + path)
//!     → storage handlers
//!     → Send to client
//! ```

pub mod access_log;
pub mod request;
pub mod server;

pub use access_log::{AccessEntry, ACCESS_LOG_TARGET};

pub use request::{MakeRequestUuid, X_REQUEST_ID};
pub use server::HttpServer;
