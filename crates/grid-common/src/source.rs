//! The upstream weather provider port.

use async_trait::async_trait;
use serde::Serialize;

use crate::bounds::Bounds;
use crate::error::GridResult;
use crate::grid::GridCell;

/// Forecast horizon requested from the upstream provider.
pub const DEFAULT_FORECAST_DAYS: u32 = 3;

/// One upstream grid request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GridRequest {
    pub bounds: Bounds,
    /// Effective sampling step in degrees, already planned.
    pub step: f64,
    pub forecast_days: u32,
}

impl GridRequest {
    pub fn new(bounds: Bounds, step: f64, forecast_days: u32) -> Self {
        Self {
            bounds,
            step,
            forecast_days,
        }
    }
}

/// A provider of per-cell hourly weather series for a bounding box.
///
/// Implementations report transport failures and non-success responses as
/// `GridError::Upstream` and unparseable payloads as
/// `GridError::MalformedResponse`. They must not retry internally.
#[async_trait]
pub trait GridSource: Send + Sync {
    /// Fetch hourly series for every grid cell the provider samples inside
    /// `request.bounds`.
    async fn fetch_grid(&self, request: &GridRequest) -> GridResult<Vec<GridCell>>;

    /// Short provider name for logs and metrics.
    fn name(&self) -> &'static str;
}
