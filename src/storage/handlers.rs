//! REST handlers over a [`Repository`].
//!
//! # Routes
//! ```text
//! HEAD|GET|POST  /config
//! GET            /<kind>/          list (v1 names, v2 names + sizes)
//! HEAD|GET       /<kind>/:name
//! POST           /<kind>/:name     write once
//! DELETE         /<kind>/:name
//! ```

use std::future::Future;
use std::sync::Arc;

use axum::body::{self, Body};
use axum::http::{header, HeaderValue, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use http_body_util::LengthLimitError;

use crate::routing::{Handler, Params, RouteError, Router};
use crate::storage::error::StorageError;
use crate::storage::repository::Repository;

/// Media type selecting the v2 listing format.
pub const REST_V2: &str = "application/vnd.x.restic.rest.v2";

const OCTET_STREAM: &str = "application/octet-stream";

/// Register the config endpoints and one route family per resource kind.
pub fn register_routes(
    router: &mut Router,
    repo: Arc<Repository>,
    kinds: &[String],
) -> Result<(), RouteError> {
    router.head("/config", with_repo(&repo, head_config))?;
    router.get("/config", with_repo(&repo, get_config))?;
    router.post("/config", with_repo(&repo, save_config))?;

    for kind in kinds {
        let kind: Arc<str> = Arc::from(kind.as_str());
        let collection = format!("/{kind}/");
        let item = format!("/{kind}/:name");

        router.get(&collection, with_kind(&repo, &kind, list_items))?;
        router.head(&item, with_kind(&repo, &kind, head_item))?;
        router.get(&item, with_kind(&repo, &kind, get_item))?;
        router.post(&item, with_kind(&repo, &kind, save_item))?;
        router.delete(&item, with_kind(&repo, &kind, delete_item))?;
    }

    tracing::debug!(kinds = kinds.len(), "Storage routes registered");
    Ok(())
}

fn with_repo<F, Fut>(repo: &Arc<Repository>, f: F) -> impl Handler
where
    F: Fn(Arc<Repository>, Request<Body>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response, StorageError>> + Send + 'static,
{
    let repo = Arc::clone(repo);
    move |request: Request<Body>, _params: Params| f(Arc::clone(&repo), request)
}

fn with_kind<F, Fut>(repo: &Arc<Repository>, kind: &Arc<str>, f: F) -> impl Handler
where
    F: Fn(Arc<Repository>, Arc<str>, Request<Body>, Params) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response, StorageError>> + Send + 'static,
{
    let repo = Arc::clone(repo);
    let kind = Arc::clone(kind);
    move |request: Request<Body>, params: Params| {
        f(Arc::clone(&repo), Arc::clone(&kind), request, params)
    }
}

async fn head_config(repo: Arc<Repository>, _request: Request<Body>) -> Result<Response, StorageError> {
    let size = repo.config_size().await?;
    Ok(content_length(size))
}

async fn get_config(repo: Arc<Repository>, _request: Request<Body>) -> Result<Response, StorageError> {
    let data = repo.read_config().await?;
    Ok(([(header::CONTENT_TYPE, OCTET_STREAM)], data).into_response())
}

async fn save_config(repo: Arc<Repository>, request: Request<Body>) -> Result<Response, StorageError> {
    let body = read_body(request).await?;
    repo.write_config(body).await?;
    Ok(StatusCode::OK.into_response())
}

async fn list_items(
    repo: Arc<Repository>,
    kind: Arc<str>,
    request: Request<Body>,
    _params: Params,
) -> Result<Response, StorageError> {
    let v2 = request
        .headers()
        .get(header::ACCEPT)
        .is_some_and(|accept| accept == REST_V2);

    let entries = repo.list(&kind).await?;
    if v2 {
        return Ok(([(header::CONTENT_TYPE, REST_V2)], Json(entries)).into_response());
    }
    let names: Vec<String> = entries.into_iter().map(|entry| entry.name).collect();
    Ok(Json(names).into_response())
}

async fn head_item(
    repo: Arc<Repository>,
    kind: Arc<str>,
    _request: Request<Body>,
    params: Params,
) -> Result<Response, StorageError> {
    let size = repo.size(&kind, item_name(&params)).await?;
    Ok(content_length(size))
}

async fn get_item(
    repo: Arc<Repository>,
    kind: Arc<str>,
    _request: Request<Body>,
    params: Params,
) -> Result<Response, StorageError> {
    let data = repo.read(&kind, item_name(&params)).await?;
    Ok(([(header::CONTENT_TYPE, OCTET_STREAM)], data).into_response())
}

async fn save_item(
    repo: Arc<Repository>,
    kind: Arc<str>,
    request: Request<Body>,
    params: Params,
) -> Result<Response, StorageError> {
    let body = read_body(request).await?;
    repo.create(&kind, item_name(&params), body).await?;
    Ok(StatusCode::OK.into_response())
}

async fn delete_item(
    repo: Arc<Repository>,
    kind: Arc<str>,
    _request: Request<Body>,
    params: Params,
) -> Result<Response, StorageError> {
    repo.remove(&kind, item_name(&params)).await?;
    Ok(StatusCode::OK.into_response())
}

fn item_name(params: &Params) -> &str {
    // routes are registered as `/<kind>/:name`
    params.get("name").unwrap_or_default()
}

/// Collect the request body. The upload limit is enforced by the body
/// limit layer; hitting it mid-stream is reported as 413.
async fn read_body(request: Request<Body>) -> Result<body::Bytes, StorageError> {
    body::to_bytes(request.into_body(), usize::MAX)
        .await
        .map_err(|e| {
            if exceeds_limit(&e) {
                StorageError::PayloadTooLarge
            } else {
                StorageError::Body(e)
            }
        })
}

fn exceeds_limit(error: &axum::Error) -> bool {
    let error: &(dyn std::error::Error + 'static) = error;
    std::iter::successors(Some(error), |&e| e.source()).any(|e| e.is::<LengthLimitError>())
}

fn content_length(size: u64) -> Response {
    let mut response = StatusCode::OK.into_response();
    response
        .headers_mut()
        .insert(header::CONTENT_LENGTH, HeaderValue::from(size));
    response
}
