//! Shared test utilities for the grid-cache workspace.
//!
//! This crate provides common testing infrastructure including:
//! - Viewport presets
//! - Synthetic hourly series and grid generators
//! - A scriptable, call-counting [`GridSource`](grid_common::GridSource)
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```
//!
//! Then import in your tests:
//!
//! ```ignore
//! use test_utils::{fixtures, MockGridSource};
//! ```

pub mod fixtures;
pub mod generators;

// Re-export commonly used items at the crate root
pub use fixtures::*;
pub use generators::*;

/// Macro for approximate floating-point equality assertions.
///
/// # Usage
///
/// ```ignore
/// use test_utils::assert_approx_eq;
///
/// assert_approx_eq!(1.0001_f64, 1.0_f64, 0.001_f64); // passes
/// assert_approx_eq!(1.1_f32, 1.0_f32, 0.001_f32);    // fails
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: f64 = $left as f64;
        let right: f64 = $right as f64;
        let epsilon: f64 = $epsilon as f64;
        let diff = (left - right).abs();
        if diff > epsilon {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}` > epsilon `{:?}`",
                left, right, diff, epsilon
            );
        }
    }};
}

/// Asserts that two grid cells sit at the same center within `epsilon`.
///
/// ```ignore
/// use test_utils::assert_cell_at;
///
/// assert_cell_at!(cells[0], (48.125, 35.125), 1e-9);
/// ```
#[macro_export]
macro_rules! assert_cell_at {
    ($cell:expr, ($lat:expr, $lon:expr), $epsilon:expr) => {{
        $crate::assert_approx_eq!($cell.lat, $lat, $epsilon);
        $crate::assert_approx_eq!($cell.lon, $lon, $epsilon);
    }};
}
