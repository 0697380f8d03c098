//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route registration (at startup):
//!     (method, "/blobs/:sha", handler)
//!     → pattern.rs (parse segments, classify specificity)
//!     → router.rs (append to the method's table)
//!     → into_service(): freeze behind Arc as the axum fallback
//!
//! Incoming request (method, path):
//!     → router.rs (scan the method's routes, keep the most specific)
//!     → pattern.rs (bind params)
//!     → handler.rs (call handler with request + params)
//!     → or 404 / 405 with Allow
//! ```
//!
//! # Design Decisions
//! - Routes are immutable once the server starts; no locks on the hot path
//! - Exact > parameterized > wildcard, registration order breaks ties
//! - Deterministic: same input always matches the same route

pub mod error;
pub mod handler;
pub mod params;
pub mod pattern;
pub mod router;

pub use error::RouteError;
pub use handler::Handler;
pub use params::Params;
pub use pattern::{Pattern, Specificity};
pub use router::{Dispatch, RouteMatch, Router};
