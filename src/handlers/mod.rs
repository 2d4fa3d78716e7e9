//! HTTP request handlers for the gridscale API.
//!
//! This module contains all the endpoint handlers for the web server and the
//! router that wires them together.

pub mod grid_utils;
pub mod land_value;
pub mod status;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::error::{GridscaleError, Result};
use crate::logging::{create_http_trace_layer, log_request_error};
use crate::state::AppState;

pub use grid_utils::{
    children_handler, gid_to_bound_handler, gid_to_geometry_handler, gid_to_lonlat_handler,
    lonlat_to_gid_handler, polyfill_handler,
};
pub use land_value::{coordinate_handler, gid_handler, polygon_handler};
pub use status::{index_handler, status_handler};

/// Longest identifier list returned in a single response
pub const MAX_LIST_ITEMS: usize = 1000;

/// Build the application router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/status", get(status_handler))
        .route("/land-value", get(coordinate_handler))
        .route("/land-value/polygon", post(polygon_handler))
        .route("/land-value/:gid", get(gid_handler))
        .route("/grid/lonlat-to-gid", get(lonlat_to_gid_handler))
        .route("/grid/gid-to-lonlat", get(gid_to_lonlat_handler))
        .route("/grid/gid-to-bound", get(gid_to_bound_handler))
        .route("/grid/gid-to-geometry", get(gid_to_geometry_handler))
        .route("/grid/polyfill", post(polyfill_handler))
        .route("/grid/children", get(children_handler))
        .layer(create_http_trace_layer())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// HTTP status for an error
pub fn status_code(error: &GridscaleError) -> StatusCode {
    if error.is_client_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

/// Structured error body
pub fn error_response(error: &GridscaleError, request_id: &str) -> Response {
    (
        status_code(error),
        Json(serde_json::json!({
            "error": error.to_string(),
            "kind": error.kind(),
            "request_id": request_id,
        })),
    )
        .into_response()
}

/// Turn a handler result into a response, logging the outcome
pub(crate) fn respond<T: Serialize>(
    endpoint: &str,
    request_id: &str,
    start_time: Instant,
    params: &str,
    result: Result<T>,
) -> Response {
    match result {
        Ok(body) => {
            info!(
                endpoint = endpoint,
                request_id = %request_id,
                duration_us = start_time.elapsed().as_micros() as u64,
                "Request successful"
            );
            Json(body).into_response()
        }
        Err(error) => {
            log_request_error(&error, endpoint, request_id, Some(params));
            error_response(&error, request_id)
        }
    }
}

/// Answer a request whose query string or body could not be parsed
pub(crate) fn rejected(
    endpoint: &str,
    request_id: &str,
    start_time: Instant,
    rejection: impl std::fmt::Display,
) -> Response {
    let error = GridscaleError::InvalidParameter {
        param: "request".to_string(),
        message: rejection.to_string(),
    };
    respond::<()>(endpoint, request_id, start_time, "unparsed", Err(error))
}

/// Run CPU-heavy work off the async executor
pub(crate) async fn run_blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| GridscaleError::Server {
            message: format!("Worker task failed: {}", e),
        })?
}

/// Reject coordinates outside the WGS84 range before they reach the engine
pub(crate) fn validate_lon_lat(lon: f64, lat: f64) -> Result<()> {
    if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
        return Err(GridscaleError::InvalidParameter {
            param: "lon".to_string(),
            message: format!("must be between -180 and 180, got {}", lon),
        });
    }
    if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
        return Err(GridscaleError::InvalidParameter {
            param: "lat".to_string(),
            message: format!("must be between -90 and 90, got {}", lat),
        });
    }
    Ok(())
}
