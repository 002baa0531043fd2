use super::*;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use std::time::Duration;
use tower::ServiceExt;


/// Helper to create a router over a test downloader with a default mock fetcher
fn create_test_app() -> (Router, Arc<AlbumDownloader>, tempfile::TempDir) {
    let (downloader, temp_dir) = crate::downloader::test_helpers::create_test_downloader();
    let downloader = Arc::new(downloader);
    let config = Arc::new(downloader.config().clone());
    let app = create_router(downloader.clone(), config);
    (app, downloader, temp_dir)
}

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _downloader, _temp) = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_cors_enabled() {
    let (downloader, _temp) = crate::downloader::test_helpers::create_test_downloader();
    let downloader = Arc::new(downloader);

    let mut config = downloader.config().clone();
    config.api.cors_enabled = true;
    config.api.cors_origins = vec!["*".to_string()];
    let app = create_router(downloader, Arc::new(config));

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response
            .headers()
            .contains_key("access-control-allow-origin"),
        "CORS header should be present when CORS is enabled"
    );
}

#[tokio::test]
async fn test_openapi_json_endpoint() {
    let (app, _downloader, _temp) = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/openapi.json")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value =
        serde_json::from_slice(&body).expect("Response should be valid JSON");

    assert!(json.get("openapi").is_some(), "Should have 'openapi' field");
    assert!(json.get("info").is_some(), "Should have 'info' field");
    assert!(json.get("paths").is_some(), "Should have 'paths' field");

    let openapi_version = json["openapi"].as_str().unwrap();
    assert!(openapi_version.starts_with("3."), "Should be OpenAPI 3.x");
    assert_eq!(json["info"]["title"], "album-dl REST API");
}

#[tokio::test]
async fn test_swagger_ui_disabled() {
    let (downloader, _temp) = crate::downloader::test_helpers::create_test_downloader();
    let downloader = Arc::new(downloader);

    let mut config = downloader.config().clone();
    config.api.swagger_ui = false;
    let app = create_router(downloader, Arc::new(config));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/swagger-ui/")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response.status(),
        StatusCode::NOT_FOUND,
        "Swagger UI should not be accessible when disabled"
    );
}

#[tokio::test]
async fn test_server_starts_and_responds_to_health() {
    let (downloader, _temp) = crate::downloader::test_helpers::create_test_downloader();
    let downloader = Arc::new(downloader);

    // Bind to a random available port (port 0)
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let mut config = downloader.config().clone();
    config.api.bind_address = addr;
    let config = Arc::new(config);

    let server_downloader = downloader.clone();
    let server_config = config.clone();
    let server_handle = tokio::spawn(async move {
        let app = create_router(server_downloader, server_config);
        axum::serve(listener, app).await.unwrap();
    });

    // Give the server a moment to start
    tokio::time::sleep(Duration::from_millis(100)).await;

    let client = reqwest::Client::new();
    let url = format!("http://{addr}/health");
    let response = client.get(url).send().await.unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::OK);

    let body = response.json::<serde_json::Value>().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));

    server_handle.abort();
}
