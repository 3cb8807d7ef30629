//! Adaptive resolution planning.
//!
//! A wide viewport at a fine step would ask upstream for thousands of
//! points. The planner coarsens the step until the estimated point count
//! fits under a ceiling, degrading resolution instead of rejecting the
//! request. It never returns a step finer than requested.

use grid_common::{lattice_step, Bounds};

/// Default upstream point ceiling.
pub const DEFAULT_POINT_CEILING: u64 = 200;

/// Computes effective sampling steps under a point ceiling.
#[derive(Debug, Clone, Copy)]
pub struct ResolutionPlanner {
    point_ceiling: u64,
}

impl Default for ResolutionPlanner {
    fn default() -> Self {
        Self::new(DEFAULT_POINT_CEILING)
    }
}

impl ResolutionPlanner {
    pub fn new(point_ceiling: u64) -> Self {
        Self {
            point_ceiling: point_ceiling.max(1),
        }
    }

    pub fn point_ceiling(&self) -> u64 {
        self.point_ceiling
    }

    /// Effective step for sampling `bounds` at `requested_step`.
    ///
    /// Returns `requested_step` unchanged when the point count already fits.
    /// Otherwise starts from the square-sampling step
    /// `sqrt(lat_span * lon_span / ceiling)`, rounds it up to 0.01°, and
    /// keeps coarsening while partial rows/columns push the count over the
    /// ceiling. Points are counted with [`Bounds::sample_points`], so thin
    /// strips with a zero span are held to the ceiling too.
    pub fn plan(&self, bounds: &Bounds, requested_step: f64) -> f64 {
        if bounds.sample_points(requested_step) <= self.point_ceiling {
            return requested_step;
        }

        let ceiling = self.point_ceiling as f64;
        let square_step = (bounds.lat_span() * bounds.lon_span() / ceiling).sqrt();
        // One row still needs the longer axis to fit on its own
        let strip_step = bounds.lat_span().max(bounds.lon_span()) / ceiling;
        let mut step = lattice_step(requested_step.max(square_step).max(strip_step));

        while bounds.sample_points(step) > self.point_ceiling {
            step = lattice_step(step + (step * 0.01).max(0.01));
        }

        tracing::debug!(
            requested_step,
            effective_step = step,
            lat_span = bounds.lat_span(),
            lon_span = bounds.lon_span(),
            "Coarsened grid step to stay under point ceiling"
        );

        step
    }

    /// The step to send upstream: [`ResolutionPlanner::plan`] moved onto
    /// the 0.01° lattice. Rounding only ever coarsens, so the point count
    /// stays under the ceiling.
    pub fn effective_step(&self, bounds: &Bounds, requested_step: f64) -> f64 {
        lattice_step(self.plan(bounds, requested_step))
    }
}
