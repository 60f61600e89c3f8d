//! Test helpers: build AppState and router for integration tests.
//!
//! Each test app owns an in-memory SQLite database and a temporary upload directory.

#![allow(dead_code)]

pub mod fixtures;

use std::path::PathBuf;

use axum_test::TestServer;
use backlog_api::setup::{build_state, database::setup_database, routes::setup_routes};
use backlog_core::Config;
use serde_json::Value;
use tempfile::TempDir;

/// Token configured for every test app
pub const TEST_API_TOKEN: &str = "test-token";
pub const PROBLEM_BASE: &str = "https://problems.secdev.local/";

/// Test application: server, pool, and owned resources.
pub struct TestApp {
    pub server: TestServer,
    pub pool: sqlx::SqlitePool,
    pub upload_dir: PathBuf,
    pub _temp_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    /// Create an item through the API and return its JSON body.
    pub async fn create_item(&self, body: Value) -> Value {
        let response = self
            .server
            .post("/items")
            .add_header("X-API-Key", TEST_API_TOKEN)
            .json(&body)
            .await;
        assert_eq!(response.status_code(), 201, "create failed: {}", response.text());
        response.json()
    }
}

/// Setup test app with an isolated database and upload directory.
pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(|_| {}).await
}

/// Like [`setup_test_app`] but lets the caller adjust the configuration first.
pub async fn setup_test_app_with(customize: impl FnOnce(&mut Config)) -> TestApp {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");

    let mut config = Config {
        database_url: "sqlite::memory:".to_string(),
        api_token: Some(TEST_API_TOKEN.to_string()),
        upload_dir: temp_dir.path().join("uploads"),
        ..Config::default()
    };
    customize(&mut config);
    let upload_dir = config.upload_dir.clone();

    let pool = setup_database(&config)
        .await
        .expect("Failed to set up test database");
    let state = build_state(config, pool.clone())
        .await
        .expect("Failed to build app state");
    let app = setup_routes(state);

    let server = TestServer::new(app.into_make_service()).expect("Failed to create test server");

    TestApp {
        server,
        pool,
        upload_dir,
        _temp_dir: temp_dir,
    }
}

/// Assert the RFC 7807 contract and return the body.
pub fn assert_problem(response: &axum_test::TestResponse, status: u16, code: &str) -> Value {
    assert_eq!(response.status_code(), status, "body: {}", response.text());

    let content_type = response.header("content-type");
    assert_eq!(content_type.to_str().unwrap(), "application/problem+json");

    let body: Value = response.json();
    assert_eq!(body["type"], format!("{}{}", PROBLEM_BASE, code));
    assert_eq!(body["status"], status);

    let correlation_id = body["correlation_id"].as_str().expect("correlation_id");
    uuid::Uuid::parse_str(correlation_id).expect("correlation_id is a UUID");
    let header = response.header("x-correlation-id");
    assert_eq!(header.to_str().unwrap(), correlation_id);

    body
}
