use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use booking_service::db::{CLIENT_INDEX, EntityStore, MemoryStore, ScanPage, StoreError, StoreResult};
use booking_service::http::{AppState, router};

fn app(page_size: u64) -> Router {
    let store = Arc::new(MemoryStore::new(CLIENT_INDEX));
    router(AppState::new(store, page_size))
}

/// Store whose every call fails with the error built by `fault`.
struct FailingStore {
    fault: fn() -> StoreError,
}

fn unavailable() -> StoreError {
    StoreError::Unavailable(redis::RedisError::from((
        redis::ErrorKind::IoError,
        "connection refused",
    )))
}

fn already_exists() -> StoreError {
    StoreError::AlreadyExists
}

#[async_trait]
impl EntityStore for FailingStore {
    async fn insert(&self, _key: &str, _record: &[u8]) -> StoreResult<()> {
        Err((self.fault)())
    }

    async fn get(&self, _key: &str) -> StoreResult<Vec<u8>> {
        Err((self.fault)())
    }

    async fn update(&self, _key: &str, _record: &[u8]) -> StoreResult<()> {
        Err((self.fault)())
    }

    async fn delete(&self, _key: &str) -> StoreResult<()> {
        Err((self.fault)())
    }

    async fn scan(&self, _cursor: u64, _size: u64) -> StoreResult<ScanPage> {
        Err((self.fault)())
    }
}

fn failing_app(fault: fn() -> StoreError) -> Router {
    router(AppState::new(Arc::new(FailingStore { fault }), 50))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
    let body = match body {
        Some(value) => Body::from(value.to_string()),
        None => Body::empty(),
    };
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body)
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, bytes.to_vec())
}

fn json_body(bytes: &[u8]) -> Value {
    serde_json::from_slice(bytes).unwrap()
}

#[tokio::test]
async fn liveness_probe_is_ok_and_empty() {
    let app = app(50);

    let (status, body) = send(&app, Method::GET, "/", None).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.is_empty());
}

#[tokio::test]
async fn create_get_delete_lifecycle() {
    let app = app(50);

    let (status, body) = send(
        &app,
        Method::POST,
        "/clients",
        Some(json!({"name": "Ada", "over_18": true, "phone_number": 5551234})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let created = json_body(&body);
    let id = created["id"].as_str().unwrap().to_string();
    assert!(created["created_at"].is_string());
    assert_eq!(created["name"], "Ada");
    assert_eq!(created["over_18"], true);
    assert_eq!(created["phone_number"], 5551234);

    let uri = format!("/clients/{id}");
    let (status, body) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body), created);

    let (status, body) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_empty());

    let (status, _) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_create_body_is_bad_request() {
    let app = app(50);

    let request = Request::builder()
        .method(Method::POST)
        .uri("/clients")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, Method::POST, "/clients", Some(json!({"over_18": "yes"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_id_is_bad_request() {
    let app = app(50);

    let (status, _) = send(&app, Method::GET, "/clients/42", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, Method::DELETE, "/clients/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn non_numeric_cursor_is_bad_request() {
    let app = app(50);

    let (status, _) = send(&app, Method::GET, "/clients?cursor=notanumber", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn empty_list_has_no_next_token() {
    let app = app(50);

    let (status, body) = send(&app, Method::GET, "/clients", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body), json!({"items": []}));
}

#[tokio::test]
async fn list_follows_next_tokens_to_the_end() {
    let app = app(2);
    for name in ["Ada", "Grace", "Edsger"] {
        let (status, _) = send(&app, Method::POST, "/clients", Some(json!({"name": name}))).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = send(&app, Method::GET, "/clients", None).await;
    assert_eq!(status, StatusCode::OK);
    let first = json_body(&body);
    assert_eq!(first["items"].as_array().unwrap().len(), 2);
    let next = first["next"].as_u64().unwrap();

    let (status, body) = send(&app, Method::GET, &format!("/clients?cursor={next}"), None).await;
    assert_eq!(status, StatusCode::OK);
    let second = json_body(&body);
    assert_eq!(second["items"].as_array().unwrap().len(), 1);
    assert!(second.get("next").is_none());

    let mut names: Vec<String> = first["items"]
        .as_array()
        .unwrap()
        .iter()
        .chain(second["items"].as_array().unwrap())
        .map(|item| item["name"].as_str().unwrap().to_string())
        .collect();
    names.sort();
    assert_eq!(names, ["Ada", "Edsger", "Grace"]);
}

#[tokio::test]
async fn put_applies_provided_fields_only() {
    let app = app(50);
    let (_, body) = send(
        &app,
        Method::POST,
        "/clients",
        Some(json!({"name": "Ada", "pronouns": "she/her", "phone_number": 5551234})),
    )
    .await;
    let created = json_body(&body);
    let uri = format!("/clients/{}", created["id"].as_str().unwrap());

    let (status, body) = send(
        &app,
        Method::PUT,
        &uri,
        Some(json!({"name": "Ada Lovelace", "created_at": "2001-01-01T00:00:00Z"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let updated = json_body(&body);
    assert_eq!(updated["name"], "Ada Lovelace");
    assert_eq!(updated["pronouns"], "she/her");
    assert_eq!(updated["phone_number"], 5551234);
    assert_eq!(updated["id"], created["id"]);
    assert_eq!(updated["created_at"], created["created_at"]);

    let (_, body) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(json_body(&body), updated);
}

#[tokio::test]
async fn put_with_empty_body_re_persists_unchanged() {
    let app = app(50);
    let (_, body) = send(&app, Method::POST, "/clients", Some(json!({"name": "Ada"}))).await;
    let created = json_body(&body);
    let uri = format!("/clients/{}", created["id"].as_str().unwrap());

    let (status, body) = send(&app, Method::PUT, &uri, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body), created);
}

#[tokio::test]
async fn put_of_unknown_client_is_not_found() {
    let app = app(50);

    let (status, _) = send(
        &app,
        Method::PUT,
        "/clients/67e55044-10b1-426f-9247-bb680e5fe0c8",
        Some(json!({"name": "Nobody"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = send(&app, Method::GET, "/clients", None).await;
    assert_eq!(json_body(&body), json!({"items": []}));
}

#[tokio::test]
async fn create_with_colliding_generated_id_is_server_error() {
    let app = failing_app(already_exists);

    let (status, body) = send(&app, Method::POST, "/clients", Some(json!({"name": "Ada"}))).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.is_empty());
}

#[tokio::test]
async fn unavailable_store_is_server_error_without_leaking_details() {
    let app = failing_app(unavailable);
    let item = "/clients/67e55044-10b1-426f-9247-bb680e5fe0c8";

    for (method, uri, body) in [
        (Method::POST, "/clients", Some(json!({"name": "Ada"}))),
        (Method::GET, "/clients", None),
        (Method::GET, item, None),
        (Method::PUT, item, Some(json!({"name": "Grace"}))),
        (Method::DELETE, item, None),
    ] {
        let (status, body) = send(&app, method.clone(), uri, body).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{method} {uri}");
        assert!(body.is_empty(), "{method} {uri}");
    }
}

#[tokio::test]
async fn cursor_beyond_u64_is_bad_request() {
    let app = app(50);

    let (status, _) = send(&app, Method::GET, "/clients?cursor=18446744073709551616", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}
