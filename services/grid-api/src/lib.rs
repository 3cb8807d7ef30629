//! Grid API Service Library
//!
//! HTTP front for the weather grid cache. A map viewport asks for the
//! hourly forecast of every cell in its bounds; the service snaps the
//! bounds, runs the cached fetch and cancels it if the client goes away.

pub mod handlers;
pub mod state;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Extension, Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;

/// Build the service router.
///
/// `prometheus` is `None` in tests, where no global recorder is installed;
/// `/metrics` then answers 503.
pub fn router(state: Arc<AppState>, prometheus: Option<PrometheusHandle>) -> Router {
    let mut app = Router::new()
        // Grid queries
        .route("/api/grid", get(handlers::grid::grid_handler))
        .route("/api/grid/cached", get(handlers::grid::cached_grid_handler))
        // Cache management
        .route("/api/cache/stats", get(handlers::cache::stats_handler))
        .route("/api/cache/clear", post(handlers::cache::clear_handler))
        // Health and metrics
        .route("/health", get(handlers::health::health_handler))
        .route("/metrics", get(handlers::health::metrics_handler));

    if let Some(handle) = prometheus {
        app = app.layer(Extension(handle));
    }

    app.layer(Extension(state))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
}
