//! Weather grid cache for map viewports.
//!
//! Sits between a map viewport and a rate-limited upstream weather API and
//! answers "hourly series for every cell in this box" while keeping upstream
//! calls and payload sizes bounded.
//!
//! # Architecture
//!
//! ```text
//! Viewport request (bounds, step, cancel token)
//!      │
//!      ▼
//! GridFetcher::fetch
//!      │
//!      ├─► GridCacheStore::get           exact key (bounds @ 0.01°, step)
//!      │
//!      ├─► CoverageMatcher::find_covering broader fresh entry, fine enough
//!      │
//!      ├─► ResolutionPlanner::plan        coarsen step under point ceiling
//!      │
//!      └─► GridSource::fetch_grid         upstream (Open-Meteo)
//!               │
//!               ▼
//!          sweep + put, return Arc<GridResponse>
//! ```
//!
//! # Example
//!
//! ```ignore
//! use grid_cache::{GridCacheConfig, GridFetcher, OpenMeteoConfig, OpenMeteoGridSource};
//!
//! let source = Arc::new(OpenMeteoGridSource::new(&OpenMeteoConfig::from_env())?);
//! let fetcher = GridFetcher::new(source, GridCacheConfig::from_env());
//!
//! let bounds = Bounds::new(48.0, 49.0, 35.0, 36.0)?;
//! let grid = fetcher.fetch(&bounds, 0.25, None).await?;
//! ```

pub mod config;
pub mod coverage;
pub mod fetcher;
pub mod planner;
pub mod store;
pub mod upstream;

// Re-export commonly used types at crate root
pub use config::{GridCacheConfig, OpenMeteoConfig};
pub use coverage::{CoverageMatcher, DEFAULT_COVERAGE_TOLERANCE};
pub use fetcher::GridFetcher;
pub use planner::{ResolutionPlanner, DEFAULT_POINT_CEILING};
pub use store::{CacheEntry, GridCacheStats, GridCacheStore, SweepReport};
pub use upstream::OpenMeteoGridSource;

pub use tokio_util::sync::CancellationToken;
