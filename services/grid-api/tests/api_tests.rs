//! Tests for the grid API router, driven in-process with a mock upstream.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use grid_api::{router, state::AppState};
use grid_cache::GridCacheConfig;
use test_utils::{MockBehavior, MockGridSource};

fn setup(source: Arc<MockGridSource>) -> (Router, Arc<AppState>) {
    let state = Arc::new(AppState::with_source(source, GridCacheConfig::default()).unwrap());
    (router(Arc::clone(&state), None), state)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

const VIEWPORT: &str = "south=48.1&west=35.1&north=48.9&east=35.9";

// ============================================================================
// Health and metrics
// ============================================================================

#[tokio::test]
async fn test_health() {
    let (app, _) = setup(Arc::new(MockGridSource::default()));

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_metrics_without_recorder() {
    let (app, _) = setup(Arc::new(MockGridSource::default()));

    let response = app.oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

// ============================================================================
// GET /api/grid
// ============================================================================

#[tokio::test]
async fn test_grid_snaps_viewport_and_returns_cells() {
    let source = Arc::new(MockGridSource::default());
    let (app, state) = setup(Arc::clone(&source));

    let uri = format!("/api/grid?{}&step=0.25", VIEWPORT);
    let response = app.oneshot(get(&uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["step"], 0.25);
    assert_eq!(body["cells"].as_array().unwrap().len(), 16);

    // 48.1..48.9 x 35.1..35.9 widened to whole quarter degrees
    let request = source.last_request().unwrap();
    assert_eq!(request.bounds.lat_min(), 48.0);
    assert_eq!(request.bounds.lat_max(), 49.0);
    assert_eq!(request.bounds.lon_min(), 35.0);
    assert_eq!(request.bounds.lon_max(), 36.0);

    assert!(state
        .fetcher
        .store()
        .get("48.00_49.00_35.00_36.00_0.25")
        .is_some());
}

#[tokio::test]
async fn test_grid_second_request_served_from_cache() {
    let source = Arc::new(MockGridSource::default());
    let (app, _) = setup(Arc::clone(&source));
    let uri = format!("/api/grid?{}", VIEWPORT);

    let first = app.clone().oneshot(get(&uri)).await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    // Slightly panned, same snapped bounds
    let second = app
        .oneshot(get("/api/grid?south=48.2&west=35.05&north=48.8&east=35.95"))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::OK);
    assert_eq!(source.calls(), 1);
}

#[tokio::test]
async fn test_grid_bbox_parameter() {
    let source = Arc::new(MockGridSource::default());
    let (app, _) = setup(Arc::clone(&source));

    let response = app
        .oneshot(get("/api/grid?bbox=48,35,49,36&step=0.5"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["cells"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_grid_missing_bounds_is_bad_request() {
    let source = Arc::new(MockGridSource::default());
    let (app, _) = setup(Arc::clone(&source));

    let response = app
        .oneshot(get("/api/grid?south=48&west=35"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = json_body(response).await;
    assert!(body["error"].as_str().unwrap().contains("Invalid bounds"));
    assert_eq!(source.calls(), 0);
}

#[tokio::test]
async fn test_grid_inverted_bounds_is_bad_request() {
    let (app, _) = setup(Arc::new(MockGridSource::default()));

    let response = app
        .oneshot(get("/api/grid?south=49&west=35&north=48&east=36"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_grid_invalid_step_is_bad_request() {
    let source = Arc::new(MockGridSource::default());
    let (app, _) = setup(Arc::clone(&source));

    let uri = format!("/api/grid?{}&step=0", VIEWPORT);
    let response = app.oneshot(get(&uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(source.calls(), 0);
}

#[tokio::test]
async fn test_grid_upstream_failure_is_bad_gateway() {
    let source = Arc::new(MockGridSource::new(MockBehavior::Status(
        429,
        "Too many concurrent requests".to_string(),
    )));
    let (app, state) = setup(Arc::clone(&source));

    let uri = format!("/api/grid?{}", VIEWPORT);
    let response = app.oneshot(get(&uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let body = json_body(response).await;
    assert!(body["error"].as_str().unwrap().contains("429"));
    assert!(state.fetcher.store().is_empty());
}

#[tokio::test]
async fn test_grid_sub_lattice_step_on_thin_viewport() {
    let source = Arc::new(MockGridSource::default());
    let (app, _) = setup(Arc::clone(&source));

    let response = app
        .oneshot(get("/api/grid?south=48&north=48&west=35&east=35.1&step=0.001"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    let step = body["step"].as_f64().unwrap();
    assert!(step > 0.0);
    assert!(body["cells"].as_array().unwrap().len() <= 200);
    assert_eq!(source.last_request().unwrap().step, step);
}

#[tokio::test]
async fn test_grid_omits_absent_optional_series() {
    let source = Arc::new(MockGridSource::new(MockBehavior::MinimalCells));
    let (app, _) = setup(Arc::clone(&source));

    let uri = format!("/api/grid?{}", VIEWPORT);
    let response = app.oneshot(get(&uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    let hourly = &body["cells"][0]["hourly"];
    assert_eq!(hourly["time"].as_array().unwrap().len(), 72);
    assert!(hourly["wind_10m"].is_array());
    assert!(hourly.get("wind_120m").is_none());
    assert!(hourly.get("cloud").is_none());
    assert!(hourly.get("vis").is_none());
}

#[tokio::test(start_paused = true)]
async fn test_client_disconnect_cancels_fetch() {
    let source = Arc::new(MockGridSource::default().with_delay(Duration::from_secs(5)));
    let (app, state) = setup(Arc::clone(&source));

    let uri = format!("/api/grid?{}", VIEWPORT);
    let request = app.oneshot(get(&uri));

    // Give up before upstream answers; dropping the future is the disconnect
    let result = tokio::time::timeout(Duration::from_secs(1), request).await;
    assert!(result.is_err());

    // Let the detached fetch task run to completion
    tokio::time::sleep(Duration::from_secs(10)).await;

    assert_eq!(source.calls(), 1);
    assert!(state.fetcher.store().is_empty());
}

// ============================================================================
// GET /api/grid/cached
// ============================================================================

#[tokio::test]
async fn test_cached_endpoint_no_content_then_hit() {
    let source = Arc::new(MockGridSource::default());
    let (app, _) = setup(Arc::clone(&source));
    let cached_uri = "/api/grid/cached?south=48.3&west=35.3&north=48.7&east=35.7";

    let response = app.clone().oneshot(get(cached_uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let uri = format!("/api/grid?{}", VIEWPORT);
    app.clone().oneshot(get(&uri)).await.unwrap();

    let response = app.oneshot(get(cached_uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["cells"].as_array().unwrap().len(), 16);

    // The cached endpoint never goes upstream
    assert_eq!(source.calls(), 1);
}

// ============================================================================
// Cache management
// ============================================================================

#[tokio::test]
async fn test_cache_stats_and_clear() {
    let source = Arc::new(MockGridSource::default());
    let (app, state) = setup(Arc::clone(&source));

    let uri = format!("/api/grid?{}", VIEWPORT);
    app.clone().oneshot(get(&uri)).await.unwrap();
    app.clone().oneshot(get(&uri)).await.unwrap();

    let response = app.clone().oneshot(get("/api/cache/stats")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let stats = json_body(response).await;
    assert_eq!(stats["entries"], 1);
    assert_eq!(stats["max_entries"], 10);
    assert_eq!(stats["ttl_secs"], 600);
    assert_eq!(stats["hits"], 1);

    let clear = Request::builder()
        .method(Method::POST)
        .uri("/api/cache/clear")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(clear).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["cleared"], 1);
    assert!(state.fetcher.store().is_empty());
}
