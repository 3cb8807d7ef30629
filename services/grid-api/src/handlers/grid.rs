//! Grid query handlers.
//!
//! `GET /api/grid` runs the full cached fetch. The fetch runs in its own
//! task holding a cancellation token; the handler keeps a drop guard for
//! that token, so a client that disconnects (dropping the handler future)
//! cancels the fetch. The upstream call still finishes, but its result is
//! not returned or cached.
//!
//! `GET /api/grid/cached` only consults the cache and never goes upstream.

use axum::{
    extract::{Extension, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, instrument};

use grid_common::{validate_step, Bounds, GridResult};

use super::{error_response, grid_error_response};
use crate::state::AppState;

/// Query parameters for grid endpoints.
///
/// Bounds come either as `bbox=south,west,north,east` or as the four
/// separate edges. `step` defaults to the configured step.
#[derive(Debug, Default, Deserialize)]
pub struct GridQueryParams {
    pub bbox: Option<String>,
    pub south: Option<f64>,
    pub west: Option<f64>,
    pub north: Option<f64>,
    pub east: Option<f64>,
    pub step: Option<f64>,
}

impl GridQueryParams {
    /// Viewport bounds as sent by the client, before snapping.
    pub fn bounds(&self) -> GridResult<Bounds> {
        if let Some(bbox) = &self.bbox {
            return Bounds::from_query_string(bbox);
        }

        match (self.south, self.west, self.north, self.east) {
            (Some(south), Some(west), Some(north), Some(east)) => {
                Bounds::new(south, north, west, east)
            }
            _ => Err(grid_common::GridError::InvalidBounds(
                "expected bbox or south, west, north and east".to_string(),
            )),
        }
    }
}

/// Resolve the snapped bounds and step for a request.
fn resolve(state: &AppState, params: &GridQueryParams) -> GridResult<(Bounds, f64)> {
    let bounds = params.bounds()?.snap_outward(state.snap_degrees);
    let step = validate_step(
        params
            .step
            .unwrap_or(state.fetcher.config().default_step),
    )?;
    Ok((bounds, step))
}

/// GET /api/grid - Hourly forecast grid for a viewport
#[instrument(skip(state))]
pub async fn grid_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<GridQueryParams>,
) -> Response {
    metrics::counter!("grid_api_requests_total", "endpoint" => "grid").increment(1);

    let (bounds, step) = match resolve(&state, &params) {
        Ok(resolved) => resolved,
        Err(e) => return grid_error_response(&e),
    };

    let token = CancellationToken::new();
    let guard = token.clone().drop_guard();
    let fetcher = Arc::clone(&state.fetcher);

    let task = tokio::spawn(async move { fetcher.fetch(&bounds, step, Some(&token)).await });
    let joined = task.await;

    // Completed normally; nothing left to cancel.
    guard.disarm();

    match joined {
        Ok(Ok(grid)) => Json(grid.as_ref()).into_response(),
        Ok(Err(e)) => {
            if e.is_cancelled() {
                debug!("Grid request cancelled");
            }
            grid_error_response(&e)
        }
        Err(e) => {
            error!(error = %e, "Grid fetch task failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Grid fetch task failed")
        }
    }
}

/// GET /api/grid/cached - Cached grid covering a viewport, if any
///
/// Returns 204 when nothing cached covers the viewport.
pub async fn cached_grid_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<GridQueryParams>,
) -> Response {
    metrics::counter!("grid_api_requests_total", "endpoint" => "cached").increment(1);

    let (bounds, step) = match resolve(&state, &params) {
        Ok(resolved) => resolved,
        Err(e) => return grid_error_response(&e),
    };

    match state.fetcher.find_covering(&bounds, step) {
        Some(grid) => Json(grid.as_ref()).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}
