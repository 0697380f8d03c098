//! Blob storage backing the REST API.
//!
//! # Data Flow
//! ```text
//! Router match (/<kind>/:name, params)
//!     → handlers.rs (read params, body, Accept header)
//!     → repository.rs (filesystem I/O under the data directory)
//!     → error.rs (StorageError → HTTP status)
//! ```
//!
//! # Design Decisions
//! - Items are write-once; overwrites are refused with 403
//! - Append-only mode refuses deletes, except for locks
//! - Names are restricted to a safe character set before touching disk

pub mod error;
pub mod handlers;
pub mod repository;

pub use error::StorageError;
pub use handlers::register_routes;
pub use repository::{Entry, Repository};

/// Whether `name` may be used as an item or resource kind on disk.
///
/// ASCII alphanumerics, `-` and `_` only, so names never contain path
/// separators or dot segments.
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}
