//! Common test fixtures for grid-cache tests.
//!
//! This module provides pre-defined viewports and a scriptable upstream
//! source that records every request it sees.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use grid_common::{GridCell, GridError, GridRequest, GridResult, GridSource};

use crate::generators::{minimal_series, synthetic_cells};

/// Common viewport definitions for testing, as
/// `(lat_min, lat_max, lon_min, lon_max)`.
pub mod viewports {
    /// One-degree box over central Ukraine (16 cells at 0.25)
    pub const SMALL: (f64, f64, f64, f64) = (48.0, 49.0, 35.0, 36.0);

    /// Twenty-degree box around the origin, coarsened by the planner
    pub const WIDE: (f64, f64, f64, f64) = (-10.0, 10.0, -10.0, 10.0);

    /// Ten-degree box inside [`WIDE`]
    pub const WIDE_INNER: (f64, f64, f64, f64) = (-5.0, 5.0, -5.0, 5.0);

    /// Half-degree box inside [`SMALL`]
    pub const SMALL_INNER: (f64, f64, f64, f64) = (48.25, 48.75, 35.25, 35.75);

    /// Box disjoint from every other preset
    pub const ALPS: (f64, f64, f64, f64) = (45.5, 47.5, 6.0, 11.0);
}

/// Builds a [`grid_common::Bounds`] from a viewport preset.
pub fn bounds(viewport: (f64, f64, f64, f64)) -> grid_common::Bounds {
    let (lat_min, lat_max, lon_min, lon_max) = viewport;
    grid_common::Bounds::new(lat_min, lat_max, lon_min, lon_max)
        .unwrap_or_else(|e| panic!("invalid viewport preset {:?}: {}", viewport, e))
}

/// What a [`MockGridSource`] does when called.
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Return synthetic cells for the request
    Cells,
    /// Return synthetic cells without the optional series
    MinimalCells,
    /// Fail with an upstream HTTP status
    Status(u16, String),
    /// Fail as if the payload could not be decoded
    Malformed(String),
}

/// Scriptable [`GridSource`] that counts calls and records requests.
pub struct MockGridSource {
    behavior: Mutex<MockBehavior>,
    calls: AtomicUsize,
    requests: Mutex<Vec<GridRequest>>,
    delay: Option<Duration>,
    cancel_on_call: Option<CancellationToken>,
}

impl Default for MockGridSource {
    fn default() -> Self {
        Self::new(MockBehavior::Cells)
    }
}

impl MockGridSource {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior: Mutex::new(behavior),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
            delay: None,
            cancel_on_call: None,
        }
    }

    /// Sleep this long inside every call (honours paused tokio time).
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Cancel `token` while the call is in flight, simulating a caller
    /// that gives up mid-request.
    pub fn cancelling(mut self, token: CancellationToken) -> Self {
        self.cancel_on_call = Some(token);
        self
    }

    pub fn set_behavior(&self, behavior: MockBehavior) {
        *self.behavior.lock() = behavior;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<GridRequest> {
        self.requests.lock().clone()
    }

    pub fn last_request(&self) -> Option<GridRequest> {
        self.requests.lock().last().copied()
    }
}

#[async_trait]
impl GridSource for MockGridSource {
    async fn fetch_grid(&self, request: &GridRequest) -> GridResult<Vec<GridCell>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push(*request);

        if let Some(token) = &self.cancel_on_call {
            token.cancel();
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let behavior = self.behavior.lock().clone();
        match behavior {
            MockBehavior::Cells => synthetic_cells(request),
            MockBehavior::MinimalCells => {
                let mut cells = synthetic_cells(request)?;
                for cell in &mut cells {
                    cell.hourly = minimal_series(cell.hourly.len());
                }
                Ok(cells)
            }
            MockBehavior::Status(status, message) => Err(GridError::upstream(Some(status), message)),
            MockBehavior::Malformed(message) => Err(GridError::malformed(message)),
        }
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_counts_and_records() {
        let source = MockGridSource::default();
        let request = GridRequest::new(bounds(viewports::SMALL), 0.25, 1);

        let cells = source.fetch_grid(&request).await.unwrap();
        assert_eq!(cells.len(), 16);
        assert_eq!(source.calls(), 1);
        assert_eq!(source.last_request().unwrap().step, 0.25);
    }

    #[tokio::test]
    async fn test_mock_status_error() {
        let source = MockGridSource::new(MockBehavior::Status(429, "slow down".into()));
        let request = GridRequest::new(bounds(viewports::SMALL), 0.25, 1);

        let err = source.fetch_grid(&request).await.unwrap_err();
        assert_eq!(err.http_status_code(), 502);
    }

    #[tokio::test]
    async fn test_mock_cancels_token_mid_call() {
        let token = CancellationToken::new();
        let source = MockGridSource::default().cancelling(token.clone());
        let request = GridRequest::new(bounds(viewports::SMALL), 0.25, 1);

        assert!(!token.is_cancelled());
        source.fetch_grid(&request).await.unwrap();
        assert!(token.is_cancelled());
    }
}
