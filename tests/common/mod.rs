//! Test helpers for Web API integration tests.
//!
//! Builds an axum-test server over an in-memory database and an in-memory
//! blob store, with rate limits high enough not to interfere.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::http::header::AUTHORIZATION;
use axum_test::multipart::{MultipartForm, Part};
use axum_test::{TestResponse, TestServer};
use serde_json::{json, Value};

use minidrive::auth::TokenService;
use minidrive::blob::MemoryBlobStore;
use minidrive::config::WebConfig;
use minidrive::db::UserRepository;
use minidrive::web::{create_router, AppState};
use minidrive::{Database, Role};

/// Secret used to sign test tokens.
pub const TEST_SECRET: &str = "test-secret-key-for-testing-only";

/// A running test server plus handles on its stores.
pub struct TestApp {
    pub server: TestServer,
    pub db: Database,
    pub blobs: Arc<MemoryBlobStore>,
}

/// Create a test server with an in-memory database and blob store.
pub async fn create_test_app() -> TestApp {
    let db = Database::open_in_memory()
        .await
        .expect("Failed to create test database");
    let blobs = Arc::new(MemoryBlobStore::new());

    let app_state = Arc::new(AppState::new(
        db.clone(),
        TokenService::new(TEST_SECRET, 3600),
        blobs.clone(),
        Duration::from_millis(500),
    ));

    let web = WebConfig {
        cors_origins: vec![],
        login_rate_limit: 1000,
        api_rate_limit: 10000,
    };

    let server =
        TestServer::new(create_router(app_state, &web)).expect("Failed to create test server");

    TestApp { server, db, blobs }
}

/// Bearer header value for a token.
pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

/// Register a user and return the response body.
pub async fn register(server: &TestServer, name: &str, email: &str, password: &str) -> Value {
    let response = server
        .post("/api/users")
        .json(&json!({ "name": name, "email": email, "password": password }))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    response.json::<Value>()
}

/// Register a user and return `(id, token)`.
pub async fn register_user(server: &TestServer, name: &str, email: &str) -> (i64, String) {
    let body = register(server, name, email, "secret1").await;
    (
        body["id"].as_i64().unwrap(),
        body["token"].as_str().unwrap().to_string(),
    )
}

/// Register an administrator and return `(id, token)`.
///
/// The role is set directly in the store; tokens pick it up on the next
/// request.
pub async fn register_admin(app: &TestApp, name: &str, email: &str) -> (i64, String) {
    let (id, token) = register_user(&app.server, name, email).await;
    UserRepository::new(app.db.pool())
        .update_role(id, Role::Administrator)
        .await
        .expect("Failed to promote user")
        .expect("User vanished");
    (id, token)
}

/// Upload a file through the API.
pub async fn upload(
    server: &TestServer,
    token: &str,
    file_name: &str,
    content_type: &str,
    content: &[u8],
) -> TestResponse {
    let part = Part::bytes(content.to_vec())
        .file_name(file_name)
        .mime_type(content_type);
    server
        .post("/api/files")
        .add_header(AUTHORIZATION, bearer(token))
        .multipart(MultipartForm::new().add_part("file", part))
        .await
}

/// Upload a small text file and return its id.
pub async fn upload_text(server: &TestServer, token: &str, file_name: &str, text: &str) -> i64 {
    let response = upload(server, token, file_name, "text/plain", text.as_bytes()).await;
    response.assert_status(axum::http::StatusCode::CREATED);
    response.json::<Value>()["id"].as_i64().unwrap()
}
