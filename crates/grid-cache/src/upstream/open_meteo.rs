//! Open-Meteo forecast API as a grid source.
//!
//! One multi-location `GET /v1/forecast` request per grid: the client lays
//! cell centers over the bounds at the requested step and asks for hourly
//! series at every center in a single call.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use grid_common::grid::nullable_series;
use grid_common::{GridCell, GridError, GridRequest, GridResult, GridSource, HourlySeries};

use crate::config::OpenMeteoConfig;

const FORECAST_PATH: &str = "/v1/forecast";
const USER_AGENT: &str = concat!("grid-cache/", env!("CARGO_PKG_VERSION"));
const HOURLY_VARIABLES: &str = "wind_speed_10m,wind_speed_120m,wind_gusts_10m,precipitation,snowfall,temperature_2m,cloud_cover,visibility";

/// Grid source backed by the Open-Meteo forecast API.
#[derive(Debug, Clone)]
pub struct OpenMeteoGridSource {
    client: Client,
    base_url: String,
}

impl OpenMeteoGridSource {
    /// Create a new source with the given configuration.
    pub fn new(config: &OpenMeteoConfig) -> GridResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| GridError::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl GridSource for OpenMeteoGridSource {
    #[instrument(skip(self, request), fields(step = request.step))]
    async fn fetch_grid(&self, request: &GridRequest) -> GridResult<Vec<GridCell>> {
        let points = request.bounds.cell_centers(request.step)?;
        let (lats, lons): (Vec<String>, Vec<String>) = points
            .iter()
            .map(|(lat, lon)| (lat.to_string(), lon.to_string()))
            .unzip();

        let url = format!("{}{}", self.base_url, FORECAST_PATH);
        let forecast_days = request.forecast_days.to_string();

        info!(points = points.len(), url = %url, "Requesting grid from Open-Meteo");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("latitude", lats.join(",").as_str()),
                ("longitude", lons.join(",").as_str()),
                ("hourly", HOURLY_VARIABLES),
                ("forecast_days", forecast_days.as_str()),
                ("timeformat", "unixtime"),
                ("wind_speed_unit", "ms"),
            ])
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Open-Meteo request failed");
                GridError::upstream(e.status().map(|s| s.as_u16()), e.to_string())
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GridError::upstream(Some(status.as_u16()), e.to_string()))?;

        if !status.is_success() {
            let message = error_reason(&body).unwrap_or(body);
            warn!(status = status.as_u16(), message = %message, "Open-Meteo returned error status");
            return Err(GridError::upstream(Some(status.as_u16()), message));
        }

        let payload: OpenMeteoPayload = serde_json::from_str(&body)?;
        let locations = payload.into_locations();

        if locations.len() != points.len() {
            return Err(GridError::malformed(format!(
                "requested {} locations, received {}",
                points.len(),
                locations.len()
            )));
        }

        let cells = points
            .into_iter()
            .zip(locations)
            .map(|((lat, lon), location)| {
                let hourly = location
                    .hourly
                    .ok_or_else(|| GridError::malformed("location is missing hourly data"))?
                    .into_series();
                hourly.validate()?;
                Ok(GridCell { lat, lon, hourly })
            })
            .collect::<GridResult<Vec<_>>>()?;

        debug!(cells = cells.len(), "Parsed Open-Meteo grid");
        Ok(cells)
    }

    fn name(&self) -> &'static str {
        "open-meteo"
    }
}

/// Open-Meteo returns an object for one location and an array for several.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OpenMeteoPayload {
    Many(Vec<OpenMeteoLocation>),
    One(Box<OpenMeteoLocation>),
}

impl OpenMeteoPayload {
    fn into_locations(self) -> Vec<OpenMeteoLocation> {
        match self {
            OpenMeteoPayload::Many(locations) => locations,
            OpenMeteoPayload::One(location) => vec![*location],
        }
    }
}

#[derive(Debug, Deserialize)]
struct OpenMeteoLocation {
    hourly: Option<OpenMeteoHourly>,
}

#[derive(Debug, Deserialize)]
struct OpenMeteoHourly {
    time: Vec<i64>,
    #[serde(deserialize_with = "nullable_series")]
    wind_speed_10m: Vec<f64>,
    #[serde(default, deserialize_with = "nullable_series")]
    wind_speed_120m: Vec<f64>,
    #[serde(deserialize_with = "nullable_series")]
    wind_gusts_10m: Vec<f64>,
    #[serde(deserialize_with = "nullable_series")]
    precipitation: Vec<f64>,
    #[serde(deserialize_with = "nullable_series")]
    snowfall: Vec<f64>,
    #[serde(deserialize_with = "nullable_series")]
    temperature_2m: Vec<f64>,
    #[serde(default, deserialize_with = "nullable_series")]
    cloud_cover: Vec<f64>,
    #[serde(default, deserialize_with = "nullable_series")]
    visibility: Vec<f64>,
}

impl OpenMeteoHourly {
    fn into_series(self) -> HourlySeries {
        HourlySeries {
            time: self.time,
            wind_10m: self.wind_speed_10m,
            wind_120m: self.wind_speed_120m,
            gusts: self.wind_gusts_10m,
            precip: self.precipitation,
            snow: self.snowfall,
            temp: self.temperature_2m,
            cloud: self.cloud_cover,
            vis: self.visibility,
        }
    }
}

#[derive(Debug, Deserialize)]
struct OpenMeteoError {
    reason: String,
}

fn error_reason(body: &str) -> Option<String> {
    serde_json::from_str::<OpenMeteoError>(body)
        .ok()
        .map(|e| e.reason)
}
