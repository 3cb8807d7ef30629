//! Fetch orchestration: the single entry point for viewport grid requests.
//!
//! ```text
//! fetch(bounds, step, cancel)
//!      │
//!      ├─► exact key lookup ──────────── hit ─► return
//!      │
//!      ├─► coverage lookup ───────────── hit ─► return (store untouched)
//!      │
//!      ├─► cancelled? ─────────────────── yes ─► Err(Cancelled)
//!      │
//!      ├─► plan effective step (0.01° lattice, never finer than requested)
//!      │
//!      ├─► upstream fetch (the only await)
//!      │
//!      ├─► cancelled? ─────────────────── yes ─► Err(Cancelled), result dropped
//!      │                                        unless configured to keep it
//!      │
//!      └─► sweep, put under key(bounds, requested step), return
//! ```
//!
//! Cancellation is cooperative. The token is checked before dispatch and
//! after the upstream call returns; an in-flight network request is never
//! interrupted.

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use grid_common::{
    format_step, validate_step, Bounds, GridError, GridRequest, GridResponse,
    GridResult, GridSource,
};

use crate::config::GridCacheConfig;
use crate::coverage::CoverageMatcher;
use crate::planner::ResolutionPlanner;
use crate::store::{CacheEntry, GridCacheStore};

/// Caching front for a [`GridSource`].
pub struct GridFetcher {
    source: Arc<dyn GridSource>,
    store: Arc<GridCacheStore>,
    planner: ResolutionPlanner,
    coverage: CoverageMatcher,
    config: GridCacheConfig,
}

impl GridFetcher {
    /// Create a fetcher with its own store sized from `config`.
    pub fn new(source: Arc<dyn GridSource>, config: GridCacheConfig) -> Self {
        let store = Arc::new(GridCacheStore::new(config.ttl(), config.max_entries));
        Self::with_store(source, store, config)
    }

    /// Create a fetcher around an existing store.
    pub fn with_store(
        source: Arc<dyn GridSource>,
        store: Arc<GridCacheStore>,
        config: GridCacheConfig,
    ) -> Self {
        let planner = ResolutionPlanner::new(config.point_ceiling);
        let coverage = CoverageMatcher::new(planner, config.coverage_tolerance);

        Self {
            source,
            store,
            planner,
            coverage,
            config,
        }
    }

    pub fn store(&self) -> &Arc<GridCacheStore> {
        &self.store
    }

    pub fn config(&self) -> &GridCacheConfig {
        &self.config
    }

    pub fn planner(&self) -> &ResolutionPlanner {
        &self.planner
    }

    /// Synchronous coverage-only lookup, for rendering from cache before
    /// committing to an asynchronous fetch. Never touches upstream.
    pub fn find_covering(&self, bounds: &Bounds, requested_step: f64) -> Option<Arc<GridResponse>> {
        validate_step(requested_step).ok()?;
        self.coverage
            .find_covering(&self.store, bounds, requested_step)
    }

    /// Fetch at the configured default step.
    pub async fn fetch_default(
        &self,
        bounds: &Bounds,
        cancel: Option<&CancellationToken>,
    ) -> GridResult<Arc<GridResponse>> {
        self.fetch(bounds, self.config.default_step, cancel).await
    }

    /// Return a grid for `bounds`, from cache when possible.
    ///
    /// The returned grid may be coarser than `requested_step`; its `step`
    /// field reports the resolution actually used.
    #[instrument(skip(self, bounds, cancel), fields(key = tracing::field::Empty))]
    pub async fn fetch(
        &self,
        bounds: &Bounds,
        requested_step: f64,
        cancel: Option<&CancellationToken>,
    ) -> GridResult<Arc<GridResponse>> {
        let requested_step = validate_step(requested_step)?;
        let key = bounds.cache_key(requested_step);
        tracing::Span::current().record("key", key.as_str());

        if let Some(entry) = self.store.get(&key) {
            debug!("Exact cache hit");
            metrics::counter!("grid_cache_lookups_total", "result" => "exact").increment(1);
            return Ok(entry.data);
        }

        if let Some(data) = self.coverage.find_covering(&self.store, bounds, requested_step) {
            debug!(cached_step = data.step, "Coverage cache hit");
            metrics::counter!("grid_cache_lookups_total", "result" => "coverage").increment(1);
            return Ok(data);
        }

        metrics::counter!("grid_cache_lookups_total", "result" => "miss").increment(1);

        if is_cancelled(cancel) {
            debug!("Cancelled before upstream dispatch");
            return Err(GridError::Cancelled);
        }

        let effective_step = self.planner.effective_step(bounds, requested_step);
        let request = GridRequest::new(*bounds, effective_step, self.config.forecast_days);

        info!(
            source = self.source.name(),
            requested_step = %format_step(requested_step),
            effective_step = %format_step(effective_step),
            points = bounds.sample_points(effective_step),
            center = ?bounds.center(),
            "Fetching grid from upstream"
        );

        let result = self.source.fetch_grid(&request).await;

        if is_cancelled(cancel) {
            metrics::counter!("grid_upstream_requests_total", "outcome" => "cancelled")
                .increment(1);

            match result {
                Ok(cells) if self.config.cache_cancelled_responses => {
                    debug!("Cancelled while awaiting upstream, caching result anyway");
                    let data = Arc::new(GridResponse::new(cells, effective_step));
                    self.insert(key, data, bounds);
                }
                _ => debug!("Cancelled while awaiting upstream, discarding result"),
            }

            return Err(GridError::Cancelled);
        }

        let cells = match result {
            Ok(cells) => cells,
            Err(e) => {
                warn!(error = %e, "Upstream grid fetch failed");
                metrics::counter!("grid_upstream_requests_total", "outcome" => "error")
                    .increment(1);
                return Err(e);
            }
        };

        metrics::counter!("grid_upstream_requests_total", "outcome" => "ok").increment(1);

        let data = Arc::new(GridResponse::new(cells, effective_step));
        self.insert(key, Arc::clone(&data), bounds);

        info!(cells = data.len(), "Cached upstream grid");
        Ok(data)
    }

    fn insert(&self, key: String, data: Arc<GridResponse>, bounds: &Bounds) {
        self.store.sweep();
        self.store.put(key, CacheEntry::new(data, *bounds));
    }
}

fn is_cancelled(cancel: Option<&CancellationToken>) -> bool {
    cancel.is_some_and(|token| token.is_cancelled())
}
