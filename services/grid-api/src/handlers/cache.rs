//! Cache inspection and management handlers.

use axum::{extract::Extension, Json};
use serde::Serialize;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CacheStatsResponse {
    pub entries: usize,
    pub max_entries: usize,
    pub ttl_secs: u64,
    pub hits: u64,
    pub misses: u64,
    pub expired: u64,
    pub evictions: u64,
    /// Exact-key hit rate as a percentage (0-100)
    pub hit_rate: f64,
}

#[derive(Debug, Serialize)]
pub struct CacheClearResponse {
    pub cleared: usize,
}

/// GET /api/cache/stats - Grid cache statistics
pub async fn stats_handler(Extension(state): Extension<Arc<AppState>>) -> Json<CacheStatsResponse> {
    let store = state.fetcher.store();
    let stats = store.stats();

    Json(CacheStatsResponse {
        entries: store.len(),
        max_entries: store.max_entries(),
        ttl_secs: store.ttl().as_secs(),
        hits: stats.hits.load(Ordering::Relaxed),
        misses: stats.misses.load(Ordering::Relaxed),
        expired: stats.expired.load(Ordering::Relaxed),
        evictions: stats.evictions.load(Ordering::Relaxed),
        hit_rate: stats.hit_rate(),
    })
}

/// POST /api/cache/clear - Drop every cached grid
pub async fn clear_handler(Extension(state): Extension<Arc<AppState>>) -> Json<CacheClearResponse> {
    let store = state.fetcher.store();
    let cleared = store.len();
    store.clear();
    Json(CacheClearResponse { cleared })
}
