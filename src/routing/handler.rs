//! The handler seam between the router and the API layer.

use std::future::Future;

use axum::body::Body;
use axum::http::Request;
use axum::response::{IntoResponse, Response};
use futures_util::future::{BoxFuture, FutureExt};

use crate::routing::params::Params;

/// Something the router can dispatch to.
///
/// Handlers receive the original request plus the parameters bound by the
/// matched pattern. Any async closure or `async fn` of the form
/// `Fn(Request<Body>, Params) -> impl Future<Output = impl IntoResponse>`
/// is a handler.
pub trait Handler: Send + Sync + 'static {
    fn call(&self, request: Request<Body>, params: Params) -> BoxFuture<'static, Response>;
}

impl<F, Fut> Handler for F
where
    F: Fn(Request<Body>, Params) -> Fut + Send + Sync + 'static,
    Fut: Future + Send + 'static,
    Fut::Output: IntoResponse,
{
    fn call(&self, request: Request<Body>, params: Params) -> BoxFuture<'static, Response> {
        let fut = (self)(request, params);
        async move { fut.await.into_response() }.boxed()
    }
}
