//! Configuration for the grid cache and its upstream client.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use grid_common::{DEFAULT_FORECAST_DAYS, DEFAULT_STEP};

/// Configuration for the grid cache and fetch orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridCacheConfig {
    /// Age after which an entry is stale, in seconds.
    pub ttl_secs: u64,

    /// Maximum number of live entries after any insert.
    pub max_entries: usize,

    /// Maximum estimated grid points sent upstream in one request.
    pub point_ceiling: u64,

    /// A cached step up to `needed_step * coverage_tolerance` still covers
    /// a request.
    pub coverage_tolerance: f64,

    /// Forecast horizon requested from upstream.
    pub forecast_days: u32,

    /// Step used when the caller does not specify one.
    pub default_step: f64,

    /// Keep responses that arrive after the caller cancelled.
    pub cache_cancelled_responses: bool,
}

impl Default for GridCacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 600,
            max_entries: 10,
            point_ceiling: 200,
            coverage_tolerance: 1.1,
            forecast_days: DEFAULT_FORECAST_DAYS,
            default_step: DEFAULT_STEP,
            cache_cancelled_responses: false,
        }
    }
}

impl GridCacheConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("GRID_CACHE_TTL_SECS") {
            if let Ok(secs) = val.parse() {
                config.ttl_secs = secs;
            }
        }

        if let Ok(val) = std::env::var("GRID_CACHE_MAX_ENTRIES") {
            if let Ok(max) = val.parse() {
                config.max_entries = max;
            }
        }

        if let Ok(val) = std::env::var("GRID_POINT_CEILING") {
            if let Ok(ceiling) = val.parse() {
                config.point_ceiling = ceiling;
            }
        }

        if let Ok(val) = std::env::var("GRID_COVERAGE_TOLERANCE") {
            if let Ok(tolerance) = val.parse() {
                config.coverage_tolerance = tolerance;
            }
        }

        if let Ok(val) = std::env::var("GRID_FORECAST_DAYS") {
            if let Ok(days) = val.parse() {
                config.forecast_days = days;
            }
        }

        if let Ok(val) = std::env::var("GRID_DEFAULT_STEP") {
            if let Ok(step) = val.parse() {
                config.default_step = step;
            }
        }

        if let Ok(val) = std::env::var("GRID_CACHE_CANCELLED") {
            config.cache_cancelled_responses = val.to_lowercase() == "true" || val == "1";
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.ttl_secs == 0 {
            return Err("ttl_secs must be > 0".to_string());
        }

        if self.max_entries == 0 {
            return Err("max_entries must be > 0".to_string());
        }

        if self.point_ceiling == 0 {
            return Err("point_ceiling must be > 0".to_string());
        }

        if !self.coverage_tolerance.is_finite() || self.coverage_tolerance < 1.0 {
            return Err("coverage_tolerance must be >= 1.0".to_string());
        }

        if self.forecast_days == 0 || self.forecast_days > 16 {
            return Err("forecast_days must be 1-16".to_string());
        }

        if !self.default_step.is_finite() || self.default_step <= 0.0 {
            return Err("default_step must be > 0".to_string());
        }

        Ok(())
    }

    /// Get the TTL as a Duration.
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

/// Connection settings for the Open-Meteo forecast API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenMeteoConfig {
    /// Base URL without the `/v1/forecast` path.
    pub base_url: String,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for OpenMeteoConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.open-meteo.com".to_string(),
            timeout_secs: 30,
        }
    }
}

impl OpenMeteoConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("OPEN_METEO_URL") {
            config.base_url = val.trim_end_matches('/').to_string();
        }

        if let Ok(val) = std::env::var("OPEN_METEO_TIMEOUT_SECS") {
            if let Ok(secs) = val.parse() {
                config.timeout_secs = secs;
            }
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = GridCacheConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.ttl(), Duration::from_secs(600));
        assert_eq!(config.max_entries, 10);
        assert_eq!(config.point_ceiling, 200);
        assert!(!config.cache_cancelled_responses);
    }

    #[test]
    fn test_validate_rejects_tolerance_below_one() {
        let config = GridCacheConfig {
            coverage_tolerance: 0.9,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_capacity() {
        let config = GridCacheConfig {
            max_entries: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
