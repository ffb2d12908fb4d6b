//! E2E tests for health check and basic server functionality

mod common;

use common::TestServer;

#[tokio::test]
async fn test_health_check() {
    let server = TestServer::new().await;

    let response = server
        .client
        .get(&server.url("/health"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body = response.text().await.unwrap();
    assert_eq!(body, "OK");
}

#[tokio::test]
async fn test_api_healthcheck_uses_envelope() {
    let server = TestServer::new().await;

    let response = server
        .client
        .get(&server.api("/healthcheck"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["statusCode"], 200);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "OK");
}

#[tokio::test]
async fn test_cors_headers() {
    let server = TestServer::new().await;

    let response = server
        .client
        .get(&server.url("/health"))
        .header("Origin", "https://test.example.com")
        .send()
        .await
        .unwrap();

    assert!(
        response
            .headers()
            .contains_key("access-control-allow-origin")
    );
}

#[tokio::test]
async fn test_404_for_unknown_routes() {
    let server = TestServer::new().await;

    let response = server
        .client
        .get(&server.url("/unknown/route"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_protected_route_requires_token() {
    let server = TestServer::new().await;

    let response = server
        .client
        .get(&server.api("/users/get-user"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 401);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["data"], serde_json::Value::Null);
}

#[tokio::test]
async fn test_garbage_token_is_rejected() {
    let server = TestServer::new().await;

    let response = server
        .client
        .get(&server.api("/users/get-user"))
        .bearer_auth("not-a-token")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn test_metrics_endpoint_is_exposed() {
    let server = TestServer::new().await;
    vidtube::metrics::init_metrics();

    server
        .client
        .get(&server.url("/health"))
        .send()
        .await
        .unwrap();

    let response = server
        .client
        .get(&server.url("/metrics"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body = response.text().await.unwrap();
    assert!(body.contains("vidtube_http_requests_total"));
}
