//! Grid utility endpoints.
//!
//! Thin wrappers around the grid addressing system: coordinate and identifier
//! conversion, cell geometry, polyfill and child enumeration.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    response::Response,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

use super::{rejected, respond, run_blocking, validate_lon_lat, MAX_LIST_ITEMS};
use crate::error::{GridscaleError, Result};
use crate::geometry::polygon_from_coordinates;
use crate::grid::{level_for_size, Bounds, LEVEL_SIZES_M, MAX_LEVEL};
use crate::logging::generate_request_id;
use crate::state::AppState;

/// Query parameters for /grid/lonlat-to-gid
#[derive(Debug, Deserialize)]
pub struct LonLatQuery {
    pub lon: f64,
    pub lat: f64,
    #[serde(default = "default_level")]
    pub level: u8,
}

/// Query parameters for endpoints taking a single identifier
#[derive(Debug, Deserialize)]
pub struct GidQuery {
    pub gid: String,
}

/// Request body for /grid/polyfill
#[derive(Debug, Clone, Deserialize)]
pub struct PolyfillRequest {
    pub coordinates: Vec<[f64; 2]>,
    /// Target cell size in metres
    #[serde(default = "default_polyfill_size")]
    pub size: u64,
    /// Only return cells fully inside the polygon
    #[serde(default = "default_fullcover")]
    pub fullcover: bool,
}

/// Query parameters for /grid/children
#[derive(Debug, Deserialize)]
pub struct ChildrenQuery {
    pub gid: String,
    /// Target cell size in metres
    #[serde(default = "default_children_size")]
    pub size: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GidResponse {
    pub gid: String,
    pub level: u8,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LonLatResponse {
    pub gid: String,
    pub lon: f64,
    pub lat: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BoundResponse {
    pub gid: String,
    #[serde(flatten)]
    pub bounds: Bounds,
}

/// List of identifiers, capped at [`MAX_LIST_ITEMS`]
#[derive(Debug, Serialize, Deserialize)]
pub struct GidListResponse {
    pub count: usize,
    pub gids: Vec<String>,
    pub truncated: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChildrenResponse {
    pub parent: String,
    pub target_size: u64,
    pub count: usize,
    pub children: Vec<String>,
    pub truncated: bool,
}

fn default_level() -> u8 {
    12
}

fn default_polyfill_size() -> u64 {
    50
}

fn default_fullcover() -> bool {
    true
}

fn default_children_size() -> u64 {
    5
}

/// Keep the first [`MAX_LIST_ITEMS`] entries; returns (total, kept, truncated)
fn cap(mut gids: Vec<String>) -> (usize, Vec<String>, bool) {
    let count = gids.len();
    let truncated = count > MAX_LIST_ITEMS;
    gids.truncate(MAX_LIST_ITEMS);
    (count, gids, truncated)
}

fn size_to_level(size: u64) -> Result<u8> {
    level_for_size(size).ok_or_else(|| GridscaleError::InvalidParameter {
        param: "size".to_string(),
        message: format!("Invalid size {}. Choose from: {:?}", size, LEVEL_SIZES_M),
    })
}

/// GeoJSON polygon of a cell box
fn bounds_geometry(b: &Bounds) -> serde_json::Value {
    serde_json::json!({
        "type": "Polygon",
        "coordinates": [[
            [b.min_lon, b.min_lat],
            [b.max_lon, b.min_lat],
            [b.max_lon, b.max_lat],
            [b.min_lon, b.max_lat],
            [b.min_lon, b.min_lat],
        ]],
    })
}

/// Handle GET /grid/lonlat-to-gid
pub async fn lonlat_to_gid_handler(
    State(state): State<Arc<AppState>>,
    params: std::result::Result<Query<LonLatQuery>, QueryRejection>,
) -> Response {
    let request_id = generate_request_id();
    let start_time = Instant::now();
    let Query(params) = match params {
        Ok(extracted) => extracted,
        Err(rejection) => return rejected("/grid/lonlat-to-gid", &request_id, start_time, rejection),
    };
    debug!(endpoint = "/grid/lonlat-to-gid", request_id = %request_id, "Processing request");

    let result = validate_lon_lat(params.lon, params.lat).and_then(|_| {
        if params.level == 0 || params.level > MAX_LEVEL {
            return Err(GridscaleError::InvalidParameter {
                param: "level".to_string(),
                message: format!("must be between 1 and {}, got {}", MAX_LEVEL, params.level),
            });
        }
        let gid = state
            .grid()
            .coordinate_to_identifier(params.lon, params.lat, params.level)?;
        Ok(GidResponse {
            gid,
            level: params.level,
        })
    });

    respond(
        "/grid/lonlat-to-gid",
        &request_id,
        start_time,
        &format!("lon={}, lat={}, level={}", params.lon, params.lat, params.level),
        result,
    )
}

/// Handle GET /grid/gid-to-lonlat; reports the lower-left corner
pub async fn gid_to_lonlat_handler(
    State(state): State<Arc<AppState>>,
    params: std::result::Result<Query<GidQuery>, QueryRejection>,
) -> Response {
    let request_id = generate_request_id();
    let start_time = Instant::now();
    let Query(params) = match params {
        Ok(extracted) => extracted,
        Err(rejection) => return rejected("/grid/gid-to-lonlat", &request_id, start_time, rejection),
    };
    debug!(endpoint = "/grid/gid-to-lonlat", request_id = %request_id, gid = %params.gid, "Processing request");

    let result = state
        .grid()
        .identifier_to_origin(&params.gid)
        .map(|(lon, lat)| LonLatResponse {
            gid: params.gid.clone(),
            lon,
            lat,
        });

    respond(
        "/grid/gid-to-lonlat",
        &request_id,
        start_time,
        &format!("gid={}", params.gid),
        result,
    )
}

/// Handle GET /grid/gid-to-bound
pub async fn gid_to_bound_handler(
    State(state): State<Arc<AppState>>,
    params: std::result::Result<Query<GidQuery>, QueryRejection>,
) -> Response {
    let request_id = generate_request_id();
    let start_time = Instant::now();
    let Query(params) = match params {
        Ok(extracted) => extracted,
        Err(rejection) => return rejected("/grid/gid-to-bound", &request_id, start_time, rejection),
    };
    debug!(endpoint = "/grid/gid-to-bound", request_id = %request_id, gid = %params.gid, "Processing request");

    let result = state
        .grid()
        .identifier_to_bounds(&params.gid)
        .map(|bounds| BoundResponse {
            gid: params.gid.clone(),
            bounds,
        });

    respond(
        "/grid/gid-to-bound",
        &request_id,
        start_time,
        &format!("gid={}", params.gid),
        result,
    )
}

/// Handle GET /grid/gid-to-geometry
pub async fn gid_to_geometry_handler(
    State(state): State<Arc<AppState>>,
    params: std::result::Result<Query<GidQuery>, QueryRejection>,
) -> Response {
    let request_id = generate_request_id();
    let start_time = Instant::now();
    let Query(params) = match params {
        Ok(extracted) => extracted,
        Err(rejection) => return rejected("/grid/gid-to-geometry", &request_id, start_time, rejection),
    };
    debug!(endpoint = "/grid/gid-to-geometry", request_id = %request_id, gid = %params.gid, "Processing request");

    let result = state
        .grid()
        .identifier_to_bounds(&params.gid)
        .map(|bounds| {
            serde_json::json!({
                "gid": params.gid,
                "geometry": bounds_geometry(&bounds),
            })
        });

    respond(
        "/grid/gid-to-geometry",
        &request_id,
        start_time,
        &format!("gid={}", params.gid),
        result,
    )
}

/// Handle POST /grid/polyfill
pub async fn polyfill_handler(
    State(state): State<Arc<AppState>>,
    request: std::result::Result<Json<PolyfillRequest>, JsonRejection>,
) -> Response {
    let request_id = generate_request_id();
    let start_time = Instant::now();
    let Json(request) = match request {
        Ok(extracted) => extracted,
        Err(rejection) => return rejected("/grid/polyfill", &request_id, start_time, rejection),
    };
    let params = format!(
        "positions={}, size={}, fullcover={}",
        request.coordinates.len(),
        request.size,
        request.fullcover
    );
    debug!(endpoint = "/grid/polyfill", request_id = %request_id, params = %params, "Processing request");

    let result = run_blocking(move || {
        let level = size_to_level(request.size)?;
        let polygon = polygon_from_coordinates(&request.coordinates)?;
        let gids = state.grid().polyfill(&polygon, level, request.fullcover)?;
        let (count, gids, truncated) = cap(gids);
        Ok(GidListResponse {
            count,
            gids,
            truncated,
        })
    })
    .await;

    respond("/grid/polyfill", &request_id, start_time, &params, result)
}

/// Handle GET /grid/children
pub async fn children_handler(
    State(state): State<Arc<AppState>>,
    params: std::result::Result<Query<ChildrenQuery>, QueryRejection>,
) -> Response {
    let request_id = generate_request_id();
    let start_time = Instant::now();
    let Query(params) = match params {
        Ok(extracted) => extracted,
        Err(rejection) => return rejected("/grid/children", &request_id, start_time, rejection),
    };
    debug!(endpoint = "/grid/children", request_id = %request_id, gid = %params.gid, "Processing request");

    let result = size_to_level(params.size).and_then(|level| {
        let children = state.grid().children(&params.gid, level)?;
        let (count, children, truncated) = cap(children);
        Ok(ChildrenResponse {
            parent: params.gid.clone(),
            target_size: params.size,
            count,
            children,
            truncated,
        })
    });

    respond(
        "/grid/children",
        &request_id,
        start_time,
        &format!("gid={}, size={}", params.gid, params.size),
        result,
    )
}
