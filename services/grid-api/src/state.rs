//! Application state for the grid API.

use anyhow::{anyhow, Result};
use std::sync::Arc;

use grid_cache::{GridCacheConfig, GridFetcher, OpenMeteoConfig, OpenMeteoGridSource};
use grid_common::{GridSource, VIEWPORT_SNAP_DEGREES};

/// Shared application state.
pub struct AppState {
    /// Cached fetch orchestrator, shared by every request.
    pub fetcher: Arc<GridFetcher>,

    /// Viewport bounds are widened to multiples of this before lookup.
    pub snap_degrees: f64,
}

impl AppState {
    /// Create a new AppState from environment configuration.
    pub fn new() -> Result<Self> {
        let cache_config = GridCacheConfig::from_env();
        let upstream_config = OpenMeteoConfig::from_env();

        let source = OpenMeteoGridSource::new(&upstream_config)?;

        tracing::info!(
            upstream = %upstream_config.base_url,
            ttl_secs = cache_config.ttl_secs,
            max_entries = cache_config.max_entries,
            point_ceiling = cache_config.point_ceiling,
            "Grid cache configured"
        );

        Self::with_source(Arc::new(source), cache_config)
    }

    /// Create state around an arbitrary upstream source.
    pub fn with_source(source: Arc<dyn GridSource>, config: GridCacheConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| anyhow!("Invalid grid cache configuration: {}", e))?;

        Ok(Self {
            fetcher: Arc::new(GridFetcher::new(source, config)),
            snap_degrees: VIEWPORT_SNAP_DEGREES,
        })
    }
}
