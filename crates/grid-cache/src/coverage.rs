//! Coverage matching: serve a request from a broader cached grid.

use std::sync::Arc;

use grid_common::{Bounds, GridResponse};

use crate::planner::ResolutionPlanner;
use crate::store::GridCacheStore;

/// Default tolerance on cached step vs. needed step.
pub const DEFAULT_COVERAGE_TOLERANCE: f64 = 1.1;

/// Scans live entries for one that covers a request.
#[derive(Debug, Clone, Copy)]
pub struct CoverageMatcher {
    planner: ResolutionPlanner,
    tolerance: f64,
}

impl CoverageMatcher {
    pub fn new(planner: ResolutionPlanner, tolerance: f64) -> Self {
        Self { planner, tolerance }
    }

    /// Find a fresh cached grid whose bounds contain `bounds` and whose step
    /// is no coarser than `needed_step * tolerance`, where `needed_step` is
    /// what a fresh fetch of this request would use.
    ///
    /// The first qualifying entry wins; there is no ranking between
    /// several candidates. The store is never modified.
    pub fn find_covering(
        &self,
        store: &GridCacheStore,
        bounds: &Bounds,
        requested_step: f64,
    ) -> Option<Arc<GridResponse>> {
        let needed_step = self.planner.plan(bounds, requested_step);
        let max_step = needed_step * self.tolerance;

        let found = store
            .values()
            .into_iter()
            .find(|entry| entry.bounds.contains(bounds) && entry.data.step <= max_step)
            .map(|entry| entry.data);

        if found.is_some() {
            tracing::debug!(
                needed_step,
                "Request covered by broader cached grid"
            );
        }

        found
    }
}
