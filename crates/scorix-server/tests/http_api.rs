use std::sync::Arc;

use assert_json_diff::assert_json_eq;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use scorix_server::auth::user_digest;
use scorix_server::{AppConfig, build_app};
use scorix_store::{MemoryStore, Store};
use serde_json::{Value, json};
use tower::ServiceExt;

fn app(store: Arc<MemoryStore>) -> Router {
    build_app(&AppConfig::default(), store)
}

fn post_method(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/method")
        .header("content-type", "application/json")
        .header("x-request-id", "test-req")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn score_envelope() -> String {
    let cfg = scorix_server::auth::AuthConfig::default();
    json!({
        "account": "horns&hoofs",
        "login": "h&f",
        "token": user_digest(Some("horns&hoofs"), "h&f", &cfg),
        "method": "online_score",
        "arguments": {"phone": "79175002040", "email": "stupnikov@otus.ru"},
    })
    .to_string()
}

#[tokio::test]
async fn root_and_healthz_answer() {
    let store = Arc::new(MemoryStore::default());

    let response = app(store.clone())
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["service"], "Scorix");
    assert_eq!(body["status"], "ok");

    let response = app(store)
        .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn unparsable_body_is_a_bad_request_envelope() {
    let store = Arc::new(MemoryStore::default());
    let response = app(store)
        .oneshot(post_method("{not json"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_json_eq!(
        json_body(response).await,
        json!({"error": "Bad Request", "code": 400})
    );
}

#[tokio::test]
async fn unknown_path_is_a_not_found_envelope() {
    let store = Arc::new(MemoryStore::default());
    let response = app(store)
        .oneshot(
            Request::builder()
                .uri("/methods/score")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_json_eq!(
        json_body(response).await,
        json!({"error": "Not Found", "code": 404})
    );
}

#[tokio::test]
async fn valid_score_request_round_trips() {
    let store = Arc::new(MemoryStore::default());
    let response = app(store)
        .oneshot(post_method(&score_envelope()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_json_eq!(
        json_body(response).await,
        json!({"response": {"score": 3.0}, "code": 200})
    );
}

#[tokio::test]
async fn forbidden_envelope_for_a_bad_token() {
    let store = Arc::new(MemoryStore::default());
    let body = json!({
        "account": "horns&hoofs",
        "login": "h&f",
        "token": "sdd",
        "method": "online_score",
        "arguments": {"phone": "79175002040", "email": "stupnikov@otus.ru"},
    })
    .to_string();
    let response = app(store).oneshot(post_method(&body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_json_eq!(
        json_body(response).await,
        json!({"error": "Forbidden", "code": 403})
    );
}

#[tokio::test]
async fn validation_message_travels_in_the_error_envelope() {
    let store = Arc::new(MemoryStore::default());
    let cfg = scorix_server::auth::AuthConfig::default();
    let body = json!({
        "account": "horns&hoofs",
        "login": "h&f",
        "token": user_digest(Some("horns&hoofs"), "h&f", &cfg),
        "method": "online_score",
        "arguments": {"phone": "89175002040"},
    })
    .to_string();
    let response = app(store).oneshot(post_method(&body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json_body(response).await;
    assert_eq!(body["code"], 422);
    assert!(body["error"].as_str().unwrap().contains("phone"));
}

#[tokio::test]
async fn store_outage_surfaces_as_internal_error_envelope() {
    let store = Arc::new(MemoryStore::default());
    store.set("i:1", r#"["books"]"#).await.unwrap();
    store.set_available(false);

    let cfg = scorix_server::auth::AuthConfig::default();
    let body = json!({
        "account": "horns&hoofs",
        "login": "h&f",
        "token": user_digest(Some("horns&hoofs"), "h&f", &cfg),
        "method": "clients_interests",
        "arguments": {"client_ids": [1]},
    })
    .to_string();
    let response = app(store).oneshot(post_method(&body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_json_eq!(
        json_body(response).await,
        json!({"error": "Internal Server Error", "code": 500})
    );
}
