//! Service status endpoints.
//!
//! Returns readiness, dataset summary, uptime and memory usage.

use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use uuid::Uuid;

use crate::grid::Bounds;
use crate::state::AppState;

/// Unique per process
static SERVER_ID: once_cell::sync::Lazy<String> =
    once_cell::sync::Lazy::new(|| Uuid::new_v4().to_string());

/// Status response structure
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    /// Always "ok" once the server is accepting requests
    pub status: String,
    pub interpolator_ready: bool,
    pub cells_loaded: usize,
    /// Bounding box of cells with values
    pub coverage: Option<Bounds>,
    /// Active estimator
    pub method: String,
    pub data_file: String,
    pub server_id: String,
    /// Current timestamp (ISO 8601 format)
    pub timestamp: String,
    pub uptime_seconds: u64,
    /// Process resident memory in bytes
    pub memory_usage_bytes: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct IndexResponse {
    pub service: String,
    pub version: String,
    pub endpoints: Vec<&'static str>,
}

const ENDPOINTS: [&str; 11] = [
    "GET /status",
    "GET /land-value?lat=&lon=",
    "GET /land-value/{gid}",
    "POST /land-value/polygon",
    "GET /grid/lonlat-to-gid?lon=&lat=&level=",
    "GET /grid/gid-to-lonlat?gid=",
    "GET /grid/gid-to-bound?gid=",
    "GET /grid/gid-to-geometry?gid=",
    "POST /grid/polyfill",
    "GET /grid/children?gid=&size=",
    "GET /",
];

/// Handle GET /
pub async fn index_handler() -> Json<IndexResponse> {
    Json(IndexResponse {
        service: "gridscale".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        endpoints: ENDPOINTS.to_vec(),
    })
}

/// Handle GET /status
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    Json(build_status(&state, SystemTime::now()))
}

fn build_status(state: &AppState, now: SystemTime) -> StatusResponse {
    let timestamp = chrono::DateTime::<chrono::Utc>::from(now)
        .to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
    let uptime = now
        .duration_since(state.started_at)
        .unwrap_or(Duration::from_secs(0));

    StatusResponse {
        status: "ok".to_string(),
        interpolator_ready: true,
        cells_loaded: state.downscaler.cell_count(),
        coverage: state.downscaler.coverage().copied(),
        method: state.downscaler.method().to_string(),
        data_file: state.data_path.clone(),
        server_id: SERVER_ID.clone(),
        timestamp,
        uptime_seconds: uptime.as_secs(),
        memory_usage_bytes: get_memory_usage(),
    }
}

/// Get current process memory usage (platform-dependent)
fn get_memory_usage() -> Option<u64> {
    #[cfg(target_os = "linux")]
    {
        // RSS is the second field of /proc/self/statm, in pages
        let statm = std::fs::read_to_string("/proc/self/statm").ok()?;
        let pages = statm.split_whitespace().nth(1)?.parse::<u64>().ok()?;
        Some(pages * 4096)
    }

    #[cfg(not(target_os = "linux"))]
    {
        None
    }
}
