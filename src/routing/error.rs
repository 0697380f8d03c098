//! Route registration errors.
//!
//! These are configuration errors: they surface while the route table is
//! being built and abort startup. Request-time mismatches never produce a
//! `RouteError`; they become `Dispatch::NotFound` or
//! `Dispatch::MethodNotAllowed`.

use thiserror::Error;

/// A malformed registration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("route method must not be empty")]
    EmptyMethod,

    #[error("invalid route method {0:?}")]
    InvalidMethod(String),

    #[error("route pattern must not be empty")]
    EmptyPattern,

    #[error("route pattern {0:?} must start with '/'")]
    MissingLeadingSlash(String),

    #[error("route pattern {0:?} contains an empty segment")]
    EmptySegment(String),

    #[error("route pattern {0:?} has a parameter without a name")]
    UnnamedParam(String),

    #[error("route pattern {pattern:?} binds parameter {name:?} more than once")]
    DuplicateParam { pattern: String, name: String },

    #[error("route pattern {0:?} has a wildcard before its final segment")]
    MisplacedWildcard(String),
}
