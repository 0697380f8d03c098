//! Secure REST server for a content-addressable blob store.
//!
//! The core is [`routing::Router`]: a method-indexed table of path patterns
//! that picks the most specific handler for each request and hands it the
//! bound path parameters.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod routing;
pub mod storage;

pub use config::ServerConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use routing::{Dispatch, Params, RouteError, Router};
