use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use stubby_gateway::{App, AppState};
use stubby_generator::RandomGenerator;
use stubby_shortener::{ShortenerService, ShortenerSettings};
use stubby_storage::{InMemoryRepository, TimeoutRepository};
use tower::ServiceExt;

fn router() -> Router {
    let service = ShortenerService::new(
        TimeoutRepository::with_default_deadline(InMemoryRepository::new()),
        RandomGenerator::default(),
        ShortenerSettings::default(),
    );
    App::router(AppState::new(Arc::new(service)))
}

async fn send(router: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn health_and_ping() {
    let router = router();

    let (status, body) = send(&router, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));

    let (status, body) = send(&router, Method::GET, "/ping", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "pong"}));
}

#[tokio::test]
async fn shorten_resolve_replace_delete() {
    let router = router();

    let (status, created) = send(
        &router,
        Method::POST,
        "/shorten",
        Some(json!({"url": "https://example.com"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["original_url"], "https://example.com");
    assert_eq!(created["access_count"], 0);
    let code = created["shortcode"].as_str().unwrap().to_string();
    assert_eq!(code.len(), 6);

    let (status, resolved) = send(&router, Method::GET, &format!("/shorten/{code}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resolved["access_count"], 1);
    assert_eq!(resolved["original_url"], "https://example.com");

    let (status, replaced) = send(
        &router,
        Method::PUT,
        &format!("/shorten/{code}"),
        Some(json!({"url": "https://example.org"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(replaced["original_url"], "https://example.org");
    assert_eq!(replaced["shortcode"], code.as_str());

    let (status, stats) = send(&router, Method::GET, &format!("/shorten/{code}/stats"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["access_count"], 1);
    assert_eq!(stats["id"], created["id"]);

    let (status, _) = send(&router, Method::DELETE, &format!("/shorten/{code}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&router, Method::GET, &format!("/shorten/{code}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "not found"}));
}

#[tokio::test]
async fn invalid_url_is_a_bad_request() {
    let router = router();

    let (status, body) = send(
        &router,
        Method::POST,
        "/shorten",
        Some(json!({"url": "not a url"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("invalid url"));
}

#[tokio::test]
async fn unknown_and_malformed_codes_are_not_found() {
    let router = router();

    for uri in ["/shorten/zzzzzz", "/shorten/bad!code", "/shorten/zzzzzz/stats"] {
        let (status, _) = send(&router, Method::GET, uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
    }

    let (status, _) = send(&router, Method::DELETE, "/shorten/zzzzzz", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &router,
        Method::PUT,
        "/shorten/zzzzzz",
        Some(json!({"url": "https://example.org"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_reports_count_and_records() {
    let router = router();

    for url in ["https://one.example", "https://two.example"] {
        let (status, _) = send(&router, Method::POST, "/shorten", Some(json!({"url": url}))).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = send(&router, Method::GET, "/shorten", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);
    assert_eq!(body["urls"].as_array().unwrap().len(), 2);
    assert_eq!(body["urls"][0]["original_url"], "https://one.example");
}

async fn send_raw(router: &Router, uri: &str, body: &'static str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap();

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn malformed_bodies_get_a_json_error() {
    let router = router();

    let (status, body) = send_raw(&router, "/shorten", "{not json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("invalid request body"));

    let (status, body) = send_raw(&router, "/shorten", r#"{"link": "https://example.com"}"#).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("url"));

    let (_, list) = send(&router, Method::GET, "/shorten", None).await;
    assert_eq!(list["count"], 0);
}
