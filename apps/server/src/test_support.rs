//! Router fixtures for handler tests.

use axum::body::Body;
use axum::http::{header, Request};
use axum::response::Response;
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use cantina_db::{Database, DbConfig};

use crate::{router, AppState, ServerConfig};

/// Router over a fresh in-memory database, plus a handle to that database.
pub async fn test_app() -> (Router, Database) {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let app = router(AppState::new(db.clone(), ServerConfig::default()));
    (app, db)
}

pub async fn post_json(app: &Router, uri: &str, body: Value) -> Response {
    let request = Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.clone().oneshot(request).await.unwrap()
}

pub async fn post_form(app: &Router, uri: &str, body: &str) -> Response {
    let request = Request::post(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.clone().oneshot(request).await.unwrap()
}

pub async fn post_empty(app: &Router, uri: &str) -> Response {
    let request = Request::post(uri).body(Body::empty()).unwrap();
    app.clone().oneshot(request).await.unwrap()
}

pub async fn json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
