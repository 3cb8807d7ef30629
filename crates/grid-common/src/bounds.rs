//! Latitude/longitude bounding boxes and the geometric predicates the cache
//! is built on.

use serde::{Deserialize, Serialize};

use crate::error::{GridError, GridResult};
use crate::step::{format_step, validate_step};

/// Decimal places kept when a coordinate is folded into a cache key.
pub const KEY_DECIMALS: i32 = 2;

/// Granularity viewports are snapped to before they reach the cache.
pub const VIEWPORT_SNAP_DEGREES: f64 = 0.25;

/// An axis-aligned latitude/longitude rectangle in degrees.
///
/// All four edges are inclusive. The constructor rejects inverted or
/// non-finite boxes, so a `Bounds` in hand always satisfies
/// `lat_min <= lat_max` and `lon_min <= lon_max`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BoundsRepr")]
pub struct Bounds {
    lat_min: f64,
    lat_max: f64,
    lon_min: f64,
    lon_max: f64,
}

#[derive(Deserialize)]
struct BoundsRepr {
    lat_min: f64,
    lat_max: f64,
    lon_min: f64,
    lon_max: f64,
}

impl TryFrom<BoundsRepr> for Bounds {
    type Error = GridError;

    fn try_from(raw: BoundsRepr) -> Result<Self, Self::Error> {
        Bounds::new(raw.lat_min, raw.lat_max, raw.lon_min, raw.lon_max)
    }
}

impl Bounds {
    /// Create a new bounding box, validating edge ordering.
    pub fn new(lat_min: f64, lat_max: f64, lon_min: f64, lon_max: f64) -> GridResult<Self> {
        let edges = [lat_min, lat_max, lon_min, lon_max];
        if edges.iter().any(|v| !v.is_finite()) {
            return Err(GridError::InvalidBounds(format!(
                "non-finite coordinate in [{}, {}, {}, {}]",
                lat_min, lat_max, lon_min, lon_max
            )));
        }
        if lat_min > lat_max {
            return Err(GridError::InvalidBounds(format!(
                "lat_min {} is greater than lat_max {}",
                lat_min, lat_max
            )));
        }
        if lon_min > lon_max {
            return Err(GridError::InvalidBounds(format!(
                "lon_min {} is greater than lon_max {}",
                lon_min, lon_max
            )));
        }

        Ok(Self {
            lat_min,
            lat_max,
            lon_min,
            lon_max,
        })
    }

    /// Parse a viewport string in "south,west,north,east" order.
    pub fn from_query_string(s: &str) -> GridResult<Self> {
        let parts: Vec<&str> = s.split(',').collect();
        if parts.len() != 4 {
            return Err(GridError::InvalidBounds(format!(
                "{}: expected 'south,west,north,east'",
                s
            )));
        }

        let parse = |part: &str| -> GridResult<f64> {
            part.trim()
                .parse()
                .map_err(|_| GridError::InvalidBounds(format!("invalid number: {}", part)))
        };

        let south = parse(parts[0])?;
        let west = parse(parts[1])?;
        let north = parse(parts[2])?;
        let east = parse(parts[3])?;

        Self::new(south, north, west, east)
    }

    pub fn lat_min(&self) -> f64 {
        self.lat_min
    }

    pub fn lat_max(&self) -> f64 {
        self.lat_max
    }

    pub fn lon_min(&self) -> f64 {
        self.lon_min
    }

    pub fn lon_max(&self) -> f64 {
        self.lon_max
    }

    /// Latitude extent in degrees.
    pub fn lat_span(&self) -> f64 {
        self.lat_max - self.lat_min
    }

    /// Longitude extent in degrees.
    pub fn lon_span(&self) -> f64 {
        self.lon_max - self.lon_min
    }

    /// Center point as (lat, lon).
    pub fn center(&self) -> (f64, f64) {
        (
            (self.lat_min + self.lat_max) / 2.0,
            (self.lon_min + self.lon_max) / 2.0,
        )
    }

    /// True iff `inner` lies entirely within this box. Edges count as inside,
    /// so every box contains itself.
    pub fn contains(&self, inner: &Bounds) -> bool {
        self.lat_min <= inner.lat_min
            && self.lat_max >= inner.lat_max
            && self.lon_min <= inner.lon_min
            && self.lon_max >= inner.lon_max
    }

    /// Check if a point is contained within this box.
    pub fn contains_point(&self, lat: f64, lon: f64) -> bool {
        lat >= self.lat_min && lat <= self.lat_max && lon >= self.lon_min && lon <= self.lon_max
    }

    /// Rough cell count for sampling this box at `step` degrees:
    /// `ceil(lat_span / step) * ceil(lon_span / step)`.
    ///
    /// Only used for planning; the upstream decides the real cell count.
    pub fn estimated_points(&self, step: f64) -> u64 {
        let rows = (self.lat_span() / step).ceil() as u64;
        let cols = (self.lon_span() / step).ceil() as u64;
        rows.saturating_mul(cols)
    }

    /// Number of cell centers [`Bounds::cell_centers`] lays over this box:
    /// like [`Bounds::estimated_points`] but with at least one cell per axis,
    /// so zero-height or zero-width strips are still counted.
    ///
    /// This is the count the planner holds under the point ceiling.
    pub fn sample_points(&self, step: f64) -> u64 {
        axis_cells(self.lat_span(), step).saturating_mul(axis_cells(self.lon_span(), step))
    }

    /// Cell centers covering this box at `step`, row-major from the
    /// south-west (latitude outer).
    ///
    /// Each axis gets `ceil(span / step)` centers (at least one), offset half
    /// a step from the minimum edge and never past the maximum edge.
    /// Coordinates are rounded to 1e-6°.
    pub fn cell_centers(&self, step: f64) -> GridResult<Vec<(f64, f64)>> {
        let step = validate_step(step)?;
        let lats = axis_centers(self.lat_min, self.lat_max, step);
        let lons = axis_centers(self.lon_min, self.lon_max, step);

        Ok(lats
            .iter()
            .flat_map(|&lat| lons.iter().map(move |&lon| (lat, lon)))
            .collect())
    }

    /// Cache key for this box sampled at `step`.
    ///
    /// Each edge is quantized to [`KEY_DECIMALS`] places, so boxes that differ
    /// by less than 0.005° collide on purpose. Layout:
    /// `lat_min_lat_max_lon_min_lon_max_step`.
    pub fn cache_key(&self, step: f64) -> String {
        format!(
            "{:.2}_{:.2}_{:.2}_{:.2}_{}",
            quantize_coord(self.lat_min),
            quantize_coord(self.lat_max),
            quantize_coord(self.lon_min),
            quantize_coord(self.lon_max),
            format_step(step)
        )
    }

    /// Snap edges outward onto a `granularity`-degree lattice, clamped to the
    /// valid lat/lon range. Small pans inside one lattice cell produce the
    /// same box and therefore the same cache key.
    pub fn snap_outward(&self, granularity: f64) -> Self {
        let scale = 1.0 / granularity;
        let lat_min = ((self.lat_min * scale).floor() / scale).max(-90.0);
        let lat_max = ((self.lat_max * scale).ceil() / scale).min(90.0);
        let lon_min = ((self.lon_min * scale).floor() / scale).max(-180.0);
        let lon_max = ((self.lon_max * scale).ceil() / scale).min(180.0);

        Self {
            lat_min: lat_min.min(lat_max),
            lat_max,
            lon_min: lon_min.min(lon_max),
            lon_max,
        }
    }
}

fn axis_cells(span: f64, step: f64) -> u64 {
    ((span / step).ceil() as u64).max(1)
}

fn axis_centers(min: f64, max: f64, step: f64) -> Vec<f64> {
    (0..axis_cells(max - min, step))
        .map(|i| {
            let center = (min + (i as f64 + 0.5) * step).min(max);
            (center * 1e6).round() / 1e6
        })
        .collect()
}

/// Round a coordinate to [`KEY_DECIMALS`] places. Negative zero is folded into
/// positive zero so `-0.001` and `0.001` share a key.
pub fn quantize_coord(value: f64) -> f64 {
    let scale = 10f64.powi(KEY_DECIMALS);
    (value * scale).round() / scale + 0.0
}
