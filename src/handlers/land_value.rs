//! Land value endpoints.
//!
//! Query by coordinate, by cell identifier, or aggregate over a polygon.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    response::Response,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

use super::{rejected, respond, run_blocking, validate_lon_lat};
use crate::geometry::{area_km2, polygon_from_coordinates};
use crate::interpolation::round_to;
use crate::logging::generate_request_id;
use crate::state::AppState;

/// Query parameters for the coordinate endpoint
#[derive(Debug, Deserialize)]
pub struct CoordinateQuery {
    pub lat: f64,
    pub lon: f64,
}

/// Request body for polygon queries
#[derive(Debug, Clone, Deserialize)]
pub struct PolygonRequest {
    /// Polygon ring as `[[lon, lat], ...]`
    pub coordinates: Vec<[f64; 2]>,
}

/// Response for polygon queries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolygonResult {
    pub area_km2: f64,
    pub cell_count: usize,
    pub avg_value: Option<f64>,
}

/// Handle GET /land-value?lat=&lon=
pub async fn coordinate_handler(
    State(state): State<Arc<AppState>>,
    params: std::result::Result<Query<CoordinateQuery>, QueryRejection>,
) -> Response {
    let request_id = generate_request_id();
    let start_time = Instant::now();
    let Query(params) = match params {
        Ok(extracted) => extracted,
        Err(rejection) => return rejected("/land-value", &request_id, start_time, rejection),
    };

    debug!(
        endpoint = "/land-value",
        request_id = %request_id,
        lon = params.lon,
        lat = params.lat,
        "Processing coordinate query"
    );

    let result = validate_lon_lat(params.lon, params.lat)
        .and_then(|_| state.downscaler.value_at_coord(params.lon, params.lat));

    respond(
        "/land-value",
        &request_id,
        start_time,
        &format!("lon={}, lat={}", params.lon, params.lat),
        result,
    )
}

/// Handle GET /land-value/:gid
pub async fn gid_handler(State(state): State<Arc<AppState>>, Path(gid): Path<String>) -> Response {
    let request_id = generate_request_id();
    let start_time = Instant::now();

    debug!(
        endpoint = "/land-value/:gid",
        request_id = %request_id,
        gid = %gid,
        "Processing identifier query"
    );

    let result = state.downscaler.value_at_gid(&gid);
    respond(
        "/land-value/:gid",
        &request_id,
        start_time,
        &format!("gid={}", gid),
        result,
    )
}

/// Handle POST /land-value/polygon
pub async fn polygon_handler(
    State(state): State<Arc<AppState>>,
    request: std::result::Result<Json<PolygonRequest>, JsonRejection>,
) -> Response {
    let request_id = generate_request_id();
    let start_time = Instant::now();
    let Json(request) = match request {
        Ok(extracted) => extracted,
        Err(rejection) => return rejected("/land-value/polygon", &request_id, start_time, rejection),
    };
    let positions = request.coordinates.len();

    debug!(
        endpoint = "/land-value/polygon",
        request_id = %request_id,
        positions = positions,
        "Processing polygon query"
    );

    let result = run_blocking(move || {
        let polygon = polygon_from_coordinates(&request.coordinates)?;
        let area = area_km2(&polygon);
        let aggregate = state.downscaler.polygon_aggregate(&polygon)?;
        Ok(PolygonResult {
            area_km2: round_to(area, 4),
            cell_count: aggregate.cell_count,
            avg_value: aggregate.avg_value,
        })
    })
    .await;

    respond(
        "/land-value/polygon",
        &request_id,
        start_time,
        &format!("positions={}", positions),
        result,
    )
}
