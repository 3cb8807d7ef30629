//! Common types shared by the weather grid cache crates.

pub mod bounds;
pub mod error;
pub mod grid;
pub mod source;
pub mod step;

pub use bounds::{quantize_coord, Bounds, VIEWPORT_SNAP_DEGREES};
pub use error::{GridError, GridResult};
pub use grid::{GridCell, GridResponse, HourlySample, HourlySeries};
pub use source::{GridRequest, GridSource, DEFAULT_FORECAST_DAYS};
pub use step::{
    format_step, lattice_step, round_step_up, validate_step, DEFAULT_STEP, MIN_STEP,
};
