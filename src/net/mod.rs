//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → axum-server rustls acceptor (certificate from tls.rs)
//!     → [authentication gate, external]
//!     → Hand off to HTTP layer
//! ```
//!
//! # Design Decisions
//! - The secure server only listens over TLS
//! - Certificate and key are resolved from config before binding

pub mod tls;

pub use tls::load_tls_config;
