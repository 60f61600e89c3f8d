mod helpers;

use helpers::setup_test_app;
use serde_json::Value;

#[tokio::test]
async fn test_health_endpoint() {
    let app = setup_test_app().await;

    let response = app.client().get("/health").await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_readiness_reports_database() {
    let app = setup_test_app().await;

    let response = app.client().get("/health/ready").await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["status"], "ready");
    assert_eq!(body["database"], "ready");
}

#[tokio::test]
async fn test_readiness_fails_when_pool_is_closed() {
    let app = setup_test_app().await;
    app.pool.close().await;

    let response = app.client().get("/health/ready").await;
    assert_eq!(response.status_code(), 503);
}
