mod helpers;

use helpers::{assert_problem, setup_test_app, TEST_API_TOKEN};
use serde_json::json;

#[tokio::test]
async fn test_correlation_header_matches_body() {
    let app = setup_test_app().await;

    let first = app.client().get("/items/41").await;
    let second = app.client().get("/items/41").await;
    let a = assert_problem(&first, 404, "not_found");
    let b = assert_problem(&second, 404, "not_found");
    assert_ne!(a["correlation_id"], b["correlation_id"]);
}

#[tokio::test]
async fn test_unknown_route_is_http_error() {
    let app = setup_test_app().await;

    let response = app.client().get("/definitely/not/here").await;
    let body = assert_problem(&response, 404, "http_error");
    assert_eq!(body["title"], "Http Error");
    assert_eq!(body["detail"], "Not Found");
}

#[tokio::test]
async fn test_wrong_method_keeps_allow_header() {
    let app = setup_test_app().await;

    let response = app.client().patch("/items").await;
    let body = assert_problem(&response, 405, "http_error");
    assert_eq!(body["detail"], "Method Not Allowed");

    let allow = response.header("allow");
    let allow = allow.to_str().unwrap();
    assert!(allow.contains("GET"));
    assert!(allow.contains("POST"));
}

#[tokio::test]
async fn test_malformed_json_is_validation_error() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .post("/items")
        .add_header("X-API-Key", TEST_API_TOKEN)
        .text("{\"name\": ")
        .content_type("application/json")
        .await;
    let body = assert_problem(&response, 422, "validation_error");
    assert_eq!(body["errors"][0]["type"], "json_invalid");
    assert_eq!(body["detail"], "JSON decode error");
}

#[tokio::test]
async fn test_wrong_json_shape_is_validation_error() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .post("/items")
        .add_header("X-API-Key", TEST_API_TOKEN)
        .json(&json!(["not", "an", "object"]))
        .await;
    let body = assert_problem(&response, 422, "validation_error");
    assert_eq!(body["errors"][0]["loc"], json!(["body"]));
}

#[tokio::test]
async fn test_non_integer_id_is_validation_error() {
    let app = setup_test_app().await;

    let response = app.client().get("/items/abc").await;
    let body = assert_problem(&response, 422, "validation_error");
    assert_eq!(body["errors"][0]["type"], "parsing");
    assert_eq!(body["errors"][0]["loc"], json!(["path", "id"]));
    assert_eq!(body["detail"], "Input should be a valid integer");
    assert!(body["errors"][0].get("input").is_none());
}

#[tokio::test]
async fn test_security_headers_on_success_and_error() {
    let app = setup_test_app().await;

    for path in ["/health", "/nope"] {
        let response = app.client().get(path).await;
        for name in [
            "x-content-type-options",
            "x-frame-options",
            "referrer-policy",
            "content-security-policy",
        ] {
            assert!(
                response.maybe_header(name).is_some(),
                "{} missing on {}",
                name,
                path
            );
        }
    }
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let app = setup_test_app().await;

    let response = app.client().get("/openapi.json").await;
    assert_eq!(response.status_code(), 200);
    let doc: serde_json::Value = response.json();
    assert!(doc["paths"]["/items/{id}/images"].is_object());
    assert!(doc["components"]["securitySchemes"]["api_key"].is_object());
}
