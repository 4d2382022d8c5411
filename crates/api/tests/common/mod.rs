#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::{Method, Request, Response};
use axum::Router;
use manuscript_api::config::AppConfig;
use manuscript_api::state::AppState;
use manuscript_core::events::EventBus;
use manuscript_core::store::MemoryStore;
use serde_json::Value;
use tower::ServiceExt;

/// Build the full application router backed by an in-memory store.
pub fn build_test_app() -> Router {
    build_test_app_with(AppConfig::default())
}

pub fn build_test_app_with(config: AppConfig) -> Router {
    build_test_app_with_bus(config).0
}

/// Like [`build_test_app_with`], also returning the bus handlers publish to.
pub fn build_test_app_with_bus(config: AppConfig) -> (Router, EventBus) {
    let bus = EventBus::new(64);
    let state = AppState::new(Arc::new(MemoryStore::new()), config, bus.clone());
    (manuscript_api::app(state), bus)
}

pub async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> Response<Body> {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.clone().oneshot(request).await.unwrap()
}

pub async fn get(app: &Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None).await
}

pub async fn post_json(app: &Router, uri: &str, body: Value) -> Response<Body> {
    send(app, Method::POST, uri, Some(body)).await
}

pub async fn patch_json(app: &Router, uri: &str, body: Value) -> Response<Body> {
    send(app, Method::PATCH, uri, Some(body)).await
}

pub async fn put_json(app: &Router, uri: &str, body: Value) -> Response<Body> {
    send(app, Method::PUT, uri, Some(body)).await
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Create an article and return its JSON representation.
pub async fn create_article(app: &Router, title: &str, content: &str) -> Value {
    let response = post_json(
        app,
        "/v1/articles?author=alice",
        serde_json::json!({ "title": title, "content": content, "template": "IEEE" }),
    )
    .await;
    assert_eq!(response.status(), axum::http::StatusCode::CREATED);
    body_json(response).await
}
