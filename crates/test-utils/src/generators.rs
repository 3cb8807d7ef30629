//! Synthetic weather data generators.
//!
//! Values are deterministic functions of position and hour so tests can
//! assert on them without fixtures on disk.

use grid_common::{GridCell, GridRequest, GridResult, HourlySeries};

/// 2024-01-15T00:00:00Z, the first hour of every generated series.
pub const SERIES_START_EPOCH: i64 = 1_705_276_800;

/// Creates an hourly series of `hours` entries with every optional
/// variable populated.
///
/// Wind rises 0.5 m/s per hour from 3 m/s; gusts are 1.5x wind; rain
/// falls only on every sixth hour; temperature follows a daily cycle.
pub fn synthetic_series(hours: usize) -> HourlySeries {
    let mut series = HourlySeries::default();

    for h in 0..hours {
        let wind = 3.0 + h as f64 * 0.5;
        let phase = (h % 24) as f64 / 24.0 * std::f64::consts::TAU;

        series.time.push(SERIES_START_EPOCH + h as i64 * 3600);
        series.wind_10m.push(wind);
        series.wind_120m.push(wind * 1.4);
        series.gusts.push(wind * 1.5);
        series.precip.push(if h % 6 == 0 { 0.4 } else { 0.0 });
        series.snow.push(0.0);
        series.temp.push(10.0 - 5.0 * phase.cos());
        series.cloud.push((h * 7 % 100) as f64);
        series.vis.push(20_000.0);
    }

    series
}

/// Creates an hourly series with only the required variables.
pub fn minimal_series(hours: usize) -> HourlySeries {
    let mut series = synthetic_series(hours);
    series.wind_120m.clear();
    series.cloud.clear();
    series.vis.clear();
    series
}

/// Creates one synthetic cell per center of `request`, each carrying
/// `forecast_days * 24` hours. Centers come from
/// [`Bounds::cell_centers`](grid_common::Bounds::cell_centers), the same
/// layout the real upstream client requests.
pub fn synthetic_cells(request: &GridRequest) -> GridResult<Vec<GridCell>> {
    let hours = request.forecast_days as usize * 24;
    Ok(request
        .bounds
        .cell_centers(request.step)?
        .into_iter()
        .map(|(lat, lon)| GridCell {
            lat,
            lon,
            hourly: synthetic_series(hours),
        })
        .collect())
}
