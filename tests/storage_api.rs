//! End-to-end tests of the REST API.

use axum::body::{Body, Bytes};
use axum::http::{header, Method, Request, StatusCode};
use secure_rest_server::http::X_REQUEST_ID;
use secure_rest_server::storage::handlers::REST_V2;

mod common;

fn request(method: Method, uri: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(body.into())
        .unwrap()
}

#[tokio::test]
async fn test_blob_lifecycle_over_http() {
    let server = common::start_server(common::test_config()).await;
    let client = reqwest::Client::builder().no_proxy().build().unwrap();

    let res = client.get(server.url("/blobs/")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), "[]");

    let res = client
        .post(server.url("/blobs/abc123"))
        .body("blob bytes")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    let res = client.get(server.url("/blobs/abc123")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert!(res.headers().contains_key("x-request-id"));
    assert_eq!(res.text().await.unwrap(), "blob bytes");

    let res = client.get(server.url("/blobs/")).send().await.unwrap();
    let names: Vec<String> = serde_json::from_str(&res.text().await.unwrap()).unwrap();
    assert_eq!(names, vec!["abc123"]);

    let res = client.delete(server.url("/blobs/abc123")).send().await.unwrap();
    assert_eq!(res.status(), 200);

    let res = client.get(server.url("/blobs/abc123")).send().await.unwrap();
    assert_eq!(res.status(), 404);

    server.stop().await;
}

#[tokio::test]
async fn test_config_round_trip() {
    let config = common::test_config();
    let root = config.path.clone();
    let app = common::build_server(config).await.app();

    let res = common::send(&app, request(Method::GET, "/config", Body::empty())).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = common::send(&app, request(Method::POST, "/config", "repo config")).await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = common::send(&app, request(Method::HEAD, "/config", Body::empty())).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()[header::CONTENT_LENGTH], "11");

    let res = common::send(&app, request(Method::GET, "/config", Body::empty())).await;
    assert_eq!(common::body_text(res).await, "repo config");

    let res = common::send(&app, request(Method::DELETE, "/config", Body::empty())).await;
    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);

    let _ = tokio::fs::remove_dir_all(root).await;
}

#[tokio::test]
async fn test_items_are_write_once_and_names_checked() {
    let config = common::test_config();
    let root = config.path.clone();
    let app = common::build_server(config).await.app();

    let res = common::send(&app, request(Method::POST, "/snapshots/s1", "one")).await;
    assert_eq!(res.status(), StatusCode::OK);
    let res = common::send(&app, request(Method::POST, "/snapshots/s1", "two")).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = common::send(&app, request(Method::GET, "/snapshots/bad.name", Body::empty())).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // deeper paths fall through to the collection route
    let res = common::send(&app, request(Method::GET, "/snapshots/s1/extra", Body::empty())).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(common::body_text(res).await, r#"["s1"]"#);

    // no such resource kind
    let res = common::send(&app, request(Method::GET, "/data/", Body::empty())).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let _ = tokio::fs::remove_dir_all(root).await;
}

#[tokio::test]
async fn test_v2_listing_includes_sizes() {
    let config = common::test_config();
    let root = config.path.clone();
    let app = common::build_server(config).await.app();

    common::send(&app, request(Method::POST, "/keys/k1", "12345")).await;

    let list = Request::builder()
        .uri("/keys/")
        .header(header::ACCEPT, REST_V2)
        .body(Body::empty())
        .unwrap();
    let res = common::send(&app, list).await;
    assert_eq!(res.headers()[header::CONTENT_TYPE], REST_V2);

    let entries: serde_json::Value = serde_json::from_str(&common::body_text(res).await).unwrap();
    assert_eq!(entries, serde_json::json!([{ "name": "k1", "size": 5 }]));

    let _ = tokio::fs::remove_dir_all(root).await;
}

#[tokio::test]
async fn test_append_only_mode() {
    let mut config = common::test_config();
    config.append_only = true;
    let root = config.path.clone();
    let app = common::build_server(config).await.app();

    common::send(&app, request(Method::POST, "/blobs/b1", "data")).await;
    common::send(&app, request(Method::POST, "/locks/l1", "lock")).await;

    let res = common::send(&app, request(Method::DELETE, "/blobs/b1", Body::empty())).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = common::send(&app, request(Method::DELETE, "/locks/l1", Body::empty())).await;
    assert_eq!(res.status(), StatusCode::OK);

    let _ = tokio::fs::remove_dir_all(root).await;
}

#[tokio::test]
async fn test_upload_limit() {
    let mut config = common::test_config();
    config.max_upload_bytes = 4;
    let root = config.path.clone();
    let app = common::build_server(config).await.app();

    let upload = Request::builder()
        .method(Method::POST)
        .uri("/blobs/big")
        .header(header::CONTENT_LENGTH, "9")
        .body(Body::from("too large"))
        .unwrap();
    let res = common::send(&app, upload).await;
    assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);

    let res = common::send(&app, request(Method::GET, "/blobs/big", Body::empty())).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let _ = tokio::fs::remove_dir_all(root).await;
}

#[tokio::test]
async fn test_streamed_upload_over_limit() {
    let mut config = common::test_config();
    config.max_upload_bytes = 4;
    let root = config.path.clone();
    let app = common::build_server(config).await.app();

    // no Content-Length: the limit trips while the body is read
    let chunks = vec![
        Ok::<_, std::io::Error>(Bytes::from_static(b"too ")),
        Ok(Bytes::from_static(b"large")),
    ];
    let upload = request(
        Method::POST,
        "/blobs/big",
        Body::from_stream(futures_util::stream::iter(chunks)),
    );
    let res = common::send(&app, upload).await;
    assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);

    let res = common::send(&app, request(Method::GET, "/blobs/big", Body::empty())).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let _ = tokio::fs::remove_dir_all(root).await;
}

#[tokio::test]
async fn test_repository_size_limit() {
    let mut config = common::test_config();
    config.max_repo_size = Some(8);
    let root = config.path.clone();
    let app = common::build_server(config).await.app();

    let res = common::send(&app, request(Method::POST, "/blobs/b1", "12345")).await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = common::send(&app, request(Method::POST, "/blobs/b2", "12345")).await;
    assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let res = common::send(&app, request(Method::HEAD, "/blobs/b2", Body::empty())).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = common::send(&app, request(Method::DELETE, "/blobs/b1", Body::empty())).await;
    assert_eq!(res.status(), StatusCode::OK);
    let res = common::send(&app, request(Method::POST, "/blobs/b2", "12345")).await;
    assert_eq!(res.status(), StatusCode::OK);

    let _ = tokio::fs::remove_dir_all(root).await;
}

#[tokio::test]
async fn test_request_id_is_preserved() {
    let config = common::test_config();
    let root = config.path.clone();
    let app = common::build_server(config).await.app();

    let req = Request::builder()
        .uri("/unknown")
        .header(X_REQUEST_ID, "req-42")
        .body(Body::empty())
        .unwrap();
    let res = common::send(&app, req).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(res.headers()[X_REQUEST_ID], "req-42");

    let _ = tokio::fs::remove_dir_all(root).await;
}
