//! Grid cells and hourly weather series.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{GridError, GridResult};

/// Parallel hourly sequences for one grid cell, all indexed by the same hour
/// offset into `time`.
///
/// `wind_120m`, `cloud` and `vis` are optional and may be empty. Callers
/// reading by hour must clamp the index with [`HourlySeries::clamp_hour`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HourlySeries {
    /// Epoch seconds, strictly increasing.
    pub time: Vec<i64>,
    /// Wind speed at 10 m (m/s)
    #[serde(deserialize_with = "nullable_series")]
    pub wind_10m: Vec<f64>,
    /// Wind speed at 120 m (m/s)
    #[serde(default, deserialize_with = "nullable_series", skip_serializing_if = "Vec::is_empty")]
    pub wind_120m: Vec<f64>,
    /// Wind gusts at 10 m (m/s)
    #[serde(deserialize_with = "nullable_series")]
    pub gusts: Vec<f64>,
    /// Precipitation (mm)
    #[serde(deserialize_with = "nullable_series")]
    pub precip: Vec<f64>,
    /// Snowfall (cm)
    #[serde(deserialize_with = "nullable_series")]
    pub snow: Vec<f64>,
    /// Air temperature at 2 m (°C)
    #[serde(deserialize_with = "nullable_series")]
    pub temp: Vec<f64>,
    /// Cloud cover (%)
    #[serde(default, deserialize_with = "nullable_series", skip_serializing_if = "Vec::is_empty")]
    pub cloud: Vec<f64>,
    /// Visibility (m)
    #[serde(default, deserialize_with = "nullable_series", skip_serializing_if = "Vec::is_empty")]
    pub vis: Vec<f64>,
}

/// Scalars for one hour of one cell. This is what a viability classifier
/// consumes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HourlySample {
    pub time: i64,
    pub wind_10m: f64,
    pub wind_120m: Option<f64>,
    pub gusts: f64,
    pub precip: f64,
    pub snow: f64,
    pub temp: f64,
    pub cloud: Option<f64>,
    pub vis: Option<f64>,
}

impl HourlySeries {
    /// Number of hours in the series.
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Clamp an hour index to the last available hour.
    pub fn clamp_hour(&self, hour: usize) -> usize {
        hour.min(self.time.len().saturating_sub(1))
    }

    /// Timestamp of a (clamped) hour.
    pub fn timestamp(&self, hour: usize) -> Option<DateTime<Utc>> {
        let secs = *self.time.get(self.clamp_hour(hour))?;
        DateTime::from_timestamp(secs, 0)
    }

    /// Scalar snapshot at a (clamped) hour. `None` for an empty series.
    pub fn sample(&self, hour: usize) -> Option<HourlySample> {
        if self.is_empty() {
            return None;
        }
        let h = self.clamp_hour(hour);

        Some(HourlySample {
            time: self.time[h],
            wind_10m: self.wind_10m.get(h).copied()?,
            wind_120m: self.wind_120m.get(h).copied(),
            gusts: self.gusts.get(h).copied()?,
            precip: self.precip.get(h).copied()?,
            snow: self.snow.get(h).copied()?,
            temp: self.temp.get(h).copied()?,
            cloud: self.cloud.get(h).copied(),
            vis: self.vis.get(h).copied(),
        })
    }

    /// Check the structural invariants of an upstream payload.
    pub fn validate(&self) -> GridResult<()> {
        if self.time.windows(2).any(|w| w[0] >= w[1]) {
            return Err(GridError::malformed("hourly time is not strictly increasing"));
        }

        let hours = self.time.len();
        let required = [
            ("wind_10m", &self.wind_10m),
            ("gusts", &self.gusts),
            ("precip", &self.precip),
            ("snow", &self.snow),
            ("temp", &self.temp),
        ];
        for (name, series) in required {
            if series.len() != hours {
                return Err(GridError::malformed(format!(
                    "series {} has {} values, expected {}",
                    name,
                    series.len(),
                    hours
                )));
            }
        }

        let optional = [
            ("wind_120m", &self.wind_120m),
            ("cloud", &self.cloud),
            ("vis", &self.vis),
        ];
        for (name, series) in optional {
            if !series.is_empty() && series.len() != hours {
                return Err(GridError::malformed(format!(
                    "optional series {} has {} values, expected 0 or {}",
                    name,
                    series.len(),
                    hours
                )));
            }
        }

        Ok(())
    }
}

/// One sampled grid point and its hourly forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridCell {
    pub lat: f64,
    pub lon: f64,
    pub hourly: HourlySeries,
}

/// A grid of cells together with the step that actually produced it.
///
/// `step` may be coarser than the caller asked for when the planner had to
/// downsample to stay under the point ceiling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridResponse {
    pub cells: Vec<GridCell>,
    pub step: f64,
}

impl GridResponse {
    pub fn new(cells: Vec<GridCell>, step: f64) -> Self {
        Self { cells, step }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Decode a numeric series whose elements may be JSON `null`. Nulls become
/// NaN; serde_json writes NaN back out as `null`.
pub fn nullable_series<'de, D>(deserializer: D) -> Result<Vec<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Vec<Option<f64>> = Vec::deserialize(deserializer)?;
    Ok(raw.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
}
