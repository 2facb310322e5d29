use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use csintel::{api_router, connect_database, AppConfig, AppState};
use http_body_util::BodyExt; // For Response body handling
use serde_json::Value;
use std::sync::Once;
use tower::ServiceExt; // For oneshot

// For initializing tracing once
static INIT: Once = Once::new();

pub fn setup() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt::try_init();
    });
}

/// Fresh in-memory database and the full route table over it.
pub async fn test_app() -> Router {
    setup();
    let db = connect_database("sqlite::memory:").await.unwrap();
    let state = AppState::new(&AppConfig::for_tests(), db).unwrap();
    api_router(state)
}

pub async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, json)
}

pub async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Method::GET, uri, None).await
}

pub async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(app, Method::POST, uri, Some(body)).await
}

/// Create a company and return its id.
pub async fn create_company(app: &Router, name: &str, category: Option<&str>) -> i64 {
    let mut body = serde_json::json!({ "name": name });
    if let Some(c) = category {
        body["category"] = Value::String(c.to_string());
    }
    let (status, json) = post(app, "/api/companies", body).await;
    assert_eq!(status, StatusCode::CREATED, "{}", json);
    json["data"]["id"].as_i64().unwrap()
}
