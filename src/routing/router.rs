//! Route table and dispatch.
//!
//! # Responsibilities
//! - Store routes per HTTP method
//! - Pick the most specific route for a method and path
//! - Tell "wrong method" apart from "no such path"
//! - Frame dispatch failures as HTTP responses
//!
//! # Design Decisions
//! - Built once at startup, then shared read-only behind `Arc`
//! - Precedence is computed from each pattern (exact > parameterized >
//!   wildcard); registration order only breaks ties
//! - Linear scan per method (a REST surface has a handful of routes)
//! - Params are returned by value, never stored on the router

use std::cmp::Reverse;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, Method, Request, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::observability::metrics;
use crate::routing::error::RouteError;
use crate::routing::handler::Handler;
use crate::routing::params::Params;
use crate::routing::pattern::{Pattern, Specificity};

struct Route {
    pattern: Pattern,
    handler: Arc<dyn Handler>,
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("pattern", &self.pattern)
            .finish_non_exhaustive()
    }
}

/// A successful dispatch.
pub struct RouteMatch<'r> {
    pattern: &'r Pattern,
    handler: &'r dyn Handler,
    params: Params,
}

impl<'r> RouteMatch<'r> {
    pub fn pattern(&self) -> &'r Pattern {
        self.pattern
    }

    pub fn specificity(&self) -> Specificity {
        self.pattern.specificity()
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn handler(&self) -> &'r dyn Handler {
        self.handler
    }

    pub fn into_params(self) -> Params {
        self.params
    }
}

impl fmt::Debug for RouteMatch<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteMatch")
            .field("pattern", &self.pattern.as_str())
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// Outcome of matching a method and path.
#[derive(Debug)]
pub enum Dispatch<'r> {
    Matched(RouteMatch<'r>),
    /// The path is served, but only under `allowed`.
    MethodNotAllowed { allowed: Vec<Method> },
    NotFound,
}

impl Dispatch<'_> {
    fn outcome(&self) -> &'static str {
        match self {
            Dispatch::Matched(_) => "matched",
            Dispatch::MethodNotAllowed { .. } => "method_not_allowed",
            Dispatch::NotFound => "not_found",
        }
    }
}

/// Method-indexed route table.
#[derive(Debug, Default)]
pub struct Router {
    routes: HashMap<Method, Vec<Route>>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `method` and `pattern`.
    ///
    /// The method is case-insensitive. Registering a pattern with the same
    /// shape as an existing one (e.g. `/blobs/:id` over `/blobs/:sha`)
    /// replaces that route's handler in place.
    pub fn register<H: Handler>(
        &mut self,
        method: &str,
        pattern: &str,
        handler: H,
    ) -> Result<(), RouteError> {
        let method = parse_method(method)?;
        let pattern = Pattern::parse(pattern)?;
        let handler: Arc<dyn Handler> = Arc::new(handler);

        let routes = self.routes.entry(method.clone()).or_default();
        let shape = pattern.shape();
        match routes.iter_mut().find(|route| route.pattern.shape() == shape) {
            Some(existing) => {
                tracing::debug!(
                    method = %method,
                    pattern = %pattern,
                    replaced = %existing.pattern,
                    "Route replaced"
                );
                existing.pattern = pattern;
                existing.handler = handler;
            }
            None => {
                tracing::debug!(method = %method, pattern = %pattern, "Route registered");
                routes.push(Route { pattern, handler });
            }
        }
        Ok(())
    }

    pub fn get<H: Handler>(&mut self, pattern: &str, handler: H) -> Result<(), RouteError> {
        self.register("GET", pattern, handler)
    }

    pub fn head<H: Handler>(&mut self, pattern: &str, handler: H) -> Result<(), RouteError> {
        self.register("HEAD", pattern, handler)
    }

    pub fn post<H: Handler>(&mut self, pattern: &str, handler: H) -> Result<(), RouteError> {
        self.register("POST", pattern, handler)
    }

    pub fn put<H: Handler>(&mut self, pattern: &str, handler: H) -> Result<(), RouteError> {
        self.register("PUT", pattern, handler)
    }

    pub fn delete<H: Handler>(&mut self, pattern: &str, handler: H) -> Result<(), RouteError> {
        self.register("DELETE", pattern, handler)
    }

    pub fn patch<H: Handler>(&mut self, pattern: &str, handler: H) -> Result<(), RouteError> {
        self.register("PATCH", pattern, handler)
    }

    /// Total number of registered routes across all methods.
    pub fn len(&self) -> usize {
        self.routes.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Select the route for `method` and `path`.
    ///
    /// Pure: the same table, method and path always give the same result.
    pub fn dispatch(&self, method: &Method, path: &str) -> Dispatch<'_> {
        let best = self
            .routes
            .get(method)
            .and_then(|routes| most_specific(routes, path));

        if let Some(route) = best {
            let params = route.pattern.captures(path).unwrap_or_default();
            return Dispatch::Matched(RouteMatch {
                pattern: &route.pattern,
                handler: route.handler.as_ref(),
                params,
            });
        }

        let mut allowed: Vec<Method> = self
            .routes
            .iter()
            .filter(|(other, _)| *other != method)
            .filter(|(_, routes)| {
                routes
                    .iter()
                    .any(|route| route.pattern.is_registered_path(path))
            })
            .map(|(other, _)| other.clone())
            .collect();

        if allowed.is_empty() {
            return Dispatch::NotFound;
        }
        allowed.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        Dispatch::MethodNotAllowed { allowed }
    }

    /// Dispatch `request` and run the selected handler.
    ///
    /// Unmatched paths get an empty 404; a path served under other methods
    /// gets an empty 405 carrying an `Allow` header.
    pub async fn handle(&self, request: Request<Body>) -> Response {
        let start = Instant::now();
        let method = request.method().clone();
        let dispatch = self.dispatch(&method, request.uri().path());
        metrics::record_dispatch(method.as_str(), dispatch.outcome());

        match dispatch {
            Dispatch::Matched(matched) => {
                tracing::debug!(
                    method = %method,
                    path = %request.uri().path(),
                    pattern = %matched.pattern,
                    params = matched.params.len(),
                    "Route matched"
                );
                let pattern = matched.pattern;
                let response = matched.handler.call(request, matched.params).await;
                metrics::record_handler(method.as_str(), pattern.as_str(), start);
                response
            }
            Dispatch::MethodNotAllowed { allowed } => {
                tracing::debug!(
                    method = %method,
                    path = %request.uri().path(),
                    "Method not allowed"
                );
                let allow = allowed
                    .iter()
                    .map(Method::as_str)
                    .collect::<Vec<_>>()
                    .join(", ");
                (StatusCode::METHOD_NOT_ALLOWED, [(header::ALLOW, allow)]).into_response()
            }
            Dispatch::NotFound => {
                tracing::debug!(method = %method, path = %request.uri().path(), "No route matched");
                StatusCode::NOT_FOUND.into_response()
            }
        }
    }

    /// Freeze the table and mount it as an axum service.
    ///
    /// The router becomes the sole fallback, so tower layers can be stacked
    /// on the result as usual.
    pub fn into_service(self) -> axum::Router {
        axum::Router::new()
            .fallback(dispatch_request)
            .with_state(Arc::new(self))
    }
}

async fn dispatch_request(State(router): State<Arc<Router>>, request: Request<Body>) -> Response {
    router.handle(request).await
}

fn parse_method(method: &str) -> Result<Method, RouteError> {
    if method.is_empty() {
        return Err(RouteError::EmptyMethod);
    }
    Method::from_bytes(method.to_ascii_uppercase().as_bytes())
        .map_err(|_| RouteError::InvalidMethod(method.to_owned()))
}

fn most_specific<'r>(routes: &'r [Route], path: &str) -> Option<&'r Route> {
    routes
        .iter()
        .enumerate()
        .filter(|(_, route)| route.pattern.is_match(path))
        .max_by_key(|(index, route)| (route.pattern.specificity(), Reverse(*index)))
        .map(|(_, route)| route)
}
