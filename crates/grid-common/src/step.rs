//! Grid sampling step (degrees between adjacent cell centers).

use crate::error::{GridError, GridResult};

/// Default sampling step for viewport requests.
pub const DEFAULT_STEP: f64 = 0.25;

/// Steps are planned on a 0.01° lattice.
const STEP_SCALE: f64 = 100.0;

/// Absorbs binary representation error (0.07 * 100 = 7.000000000000001).
const STEP_EPSILON: f64 = 1e-9;

/// Validate a requested step: finite and strictly positive.
pub fn validate_step(step: f64) -> GridResult<f64> {
    if step.is_finite() && step > 0.0 {
        Ok(step)
    } else {
        Err(GridError::InvalidStep(step))
    }
}

/// Finest step ever sent upstream.
pub const MIN_STEP: f64 = 0.01;

/// Round a step up to the next 0.01°. Values already on the lattice are kept.
pub fn round_step_up(step: f64) -> f64 {
    ((step * STEP_SCALE) - STEP_EPSILON).ceil() / STEP_SCALE
}

/// The step actually sent upstream for a planned step: rounded up onto the
/// 0.01° lattice and never below [`MIN_STEP`]. Never finer than `step`, so it
/// never samples more points.
pub fn lattice_step(step: f64) -> f64 {
    round_step_up(step).max(MIN_STEP)
}

/// Render a step for cache keys and logs ("0.25", "1", "0.125").
pub fn format_step(step: f64) -> String {
    let trimmed = (step * 1e6).round() / 1e6 + 0.0;
    format!("{}", trimmed)
}
