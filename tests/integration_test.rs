//! Integration tests for gridscale server
//!
//! These tests verify that the server works correctly end-to-end.

mod common;

use common::assertions::assert_json_approx;
use common::test_data::{self, BLOCK_LAT, BLOCK_LON};
use common::http_client;
use gridscale::config::ServerConfig;
use gridscale::{AppState, Config, Downscaler, SquareGrid};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;

/// A running test server and the data it was started with
struct TestServer {
    addr: SocketAddr,
    gids: Vec<String>,
    _dir: tempfile::TempDir,
}

/// Start a server on an ephemeral port, backed by the 3x3 test block
async fn start_test_server() -> TestServer {
    let dir = tempfile::tempdir().unwrap();
    let file_path = dir.path().join("cells.parquet");
    let gids = test_data::create_block_parquet(&file_path).unwrap();

    let config = Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            workers: Some(1),
        },
        ..Default::default()
    };
    let downscaler = Downscaler::load(
        &file_path,
        &config.data,
        Arc::new(SquareGrid::new()),
        config.interpolation.clone(),
    )
    .expect("Failed to load test parquet file");

    let state = AppState::new_shared(config, downscaler, file_path.to_string_lossy());
    let app = gridscale::router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server error");
    });

    TestServer {
        addr,
        gids,
        _dir: dir,
    }
}

async fn error_kind(addr: &SocketAddr, path: &str) -> (u16, String) {
    let response = http_client::get(addr, path).await.unwrap();
    let status = response.status().as_u16();
    let body: Value = response.json().await.unwrap();
    (status, body["kind"].as_str().unwrap_or_default().to_string())
}

#[tokio::test]
async fn test_index_and_status() {
    let server = start_test_server().await;

    let index: Value = http_client::get_json(&server.addr, "/").await.unwrap();
    assert_eq!(index["service"], "gridscale");

    let status: Value = http_client::get_json(&server.addr, "/status").await.unwrap();
    assert_eq!(status["status"], "ok");
    assert_eq!(status["interpolator_ready"], true);
    assert_eq!(status["cells_loaded"], 9);
    assert_eq!(status["method"], "idw");
    assert!(status["coverage"]["min_lon"].as_f64().unwrap() < BLOCK_LON);
}

#[tokio::test]
async fn test_land_value_by_coordinate() {
    let server = start_test_server().await;

    let body: Value = http_client::get_json(
        &server.addr,
        &format!("/land-value?lat={}&lon={}", BLOCK_LAT, BLOCK_LON),
    )
    .await
    .unwrap();

    assert_eq!(body["level"], 14);
    assert_eq!(body["source"], "interpolated");
    assert!(body["gid"].as_str().unwrap().starts_with(&server.gids[4]));
    let value = body["value"].as_f64().unwrap();
    assert!((1.0..=9.0).contains(&value));
}

#[tokio::test]
async fn test_land_value_out_of_coverage() {
    let server = start_test_server().await;

    let (status, kind) = error_kind(&server.addr, "/land-value?lat=0&lon=0").await;
    assert_eq!(status, 400);
    assert_eq!(kind, "out_of_coverage");

    let (status, kind) = error_kind(&server.addr, "/land-value?lat=95&lon=0").await;
    assert_eq!(status, 400);
    assert_eq!(kind, "invalid_parameter");
}

#[tokio::test]
async fn test_land_value_by_gid() {
    let server = start_test_server().await;

    let body: Value =
        http_client::get_json(&server.addr, &format!("/land-value/{}", server.gids[4]))
            .await
            .unwrap();
    assert_eq!(body["value"], 5.0);
    assert_eq!(body["source"], "original");

    let (status, kind) =
        error_kind(&server.addr, &format!("/land-value/{}", &server.gids[4][..10])).await;
    assert_eq!(status, 400);
    assert_eq!(kind, "unsupported_level");
}

#[tokio::test]
async fn test_land_value_polygon() {
    let server = start_test_server().await;
    let grid_bounds: Value = http_client::get_json(
        &server.addr,
        &format!("/grid/gid-to-bound?gid={}", server.gids[4]),
    )
    .await
    .unwrap();
    let min_lon = grid_bounds["min_lon"].as_f64().unwrap() + 1e-6;
    let min_lat = grid_bounds["min_lat"].as_f64().unwrap() + 1e-6;
    let max_lon = grid_bounds["max_lon"].as_f64().unwrap() - 1e-6;
    let max_lat = grid_bounds["max_lat"].as_f64().unwrap() - 1e-6;

    let request = json!({
        "coordinates": [
            [min_lon, min_lat],
            [max_lon, min_lat],
            [max_lon, max_lat],
            [min_lon, max_lat],
            [min_lon, min_lat],
        ]
    });
    let body: Value = http_client::post_json_ok(&server.addr, "/land-value/polygon", &request)
        .await
        .unwrap();

    assert_eq!(body["cell_count"], 1);
    assert_eq!(body["avg_value"], 5.0);
    // A 50 m cell is about 0.0025 km2
    assert_json_approx(&body, "area_km2", 0.0025, 0.0005);
}

#[tokio::test]
async fn test_land_value_polygon_too_few_positions() {
    let server = start_test_server().await;
    let request = json!({"coordinates": [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0]]});

    let response = http_client::post_json(&server.addr, "/land-value/polygon", &request)
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["kind"], "invalid_polygon");
}

#[tokio::test]
async fn test_land_value_large_polygon() {
    let server = start_test_server().await;

    // Open ring over a degree square far from the data: closed and aggregated
    let empty = json!({"coordinates": [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]});
    let body: Value = http_client::post_json_ok(&server.addr, "/land-value/polygon", &empty)
        .await
        .unwrap();
    assert_eq!(body["cell_count"], 0);
    assert_eq!(body["avg_value"], Value::Null);
    assert!(body["area_km2"].as_f64().unwrap() > 10_000.0);

    // Two by one degrees around the whole block
    let wide = json!({"coordinates": [
        [106.0, -7.0], [108.0, -7.0], [108.0, -6.0], [106.0, -6.0], [106.0, -7.0]
    ]});
    let body: Value = http_client::post_json_ok(&server.addr, "/land-value/polygon", &wide)
        .await
        .unwrap();
    assert_eq!(body["cell_count"], 9);
    assert_eq!(body["avg_value"], 5.0);
}

#[tokio::test]
async fn test_malformed_requests_get_error_body() {
    let server = start_test_server().await;

    let (status, kind) = error_kind(&server.addr, "/land-value?lat=1").await;
    assert_eq!(status, 400);
    assert_eq!(kind, "invalid_parameter");

    let (status, kind) = error_kind(&server.addr, "/grid/lonlat-to-gid?lon=abc&lat=0").await;
    assert_eq!(status, 400);
    assert_eq!(kind, "invalid_parameter");

    let response = http_client::post_json(&server.addr, "/grid/polyfill", &json!({"size": 50}))
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["kind"], "invalid_parameter");
    assert!(body["request_id"].as_str().is_some());
}

#[tokio::test]
async fn test_grid_conversions() {
    let server = start_test_server().await;

    let body: Value = http_client::get_json(
        &server.addr,
        &format!("/grid/lonlat-to-gid?lon={}&lat={}", BLOCK_LON, BLOCK_LAT),
    )
    .await
    .unwrap();
    assert_eq!(body["gid"], server.gids[4].as_str());
    assert_eq!(body["level"], 12);

    let origin: Value = http_client::get_json(
        &server.addr,
        &format!("/grid/gid-to-lonlat?gid={}", server.gids[4]),
    )
    .await
    .unwrap();
    let bounds: Value = http_client::get_json(
        &server.addr,
        &format!("/grid/gid-to-bound?gid={}", server.gids[4]),
    )
    .await
    .unwrap();
    assert_eq!(origin["lon"], bounds["min_lon"]);
    assert_eq!(origin["lat"], bounds["min_lat"]);

    let geometry: Value = http_client::get_json(
        &server.addr,
        &format!("/grid/gid-to-geometry?gid={}", server.gids[4]),
    )
    .await
    .unwrap();
    assert_eq!(geometry["geometry"]["type"], "Polygon");
    assert_eq!(geometry["geometry"]["coordinates"][0][0][0], bounds["min_lon"]);

    let (status, kind) = error_kind(&server.addr, "/grid/gid-to-bound?gid=0I").await;
    assert_eq!(status, 400);
    assert_eq!(kind, "invalid_identifier");

    let (status, _) = error_kind(&server.addr, "/grid/lonlat-to-gid?lon=0&lat=0&level=16").await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn test_grid_children() {
    let server = start_test_server().await;

    let body: Value = http_client::get_json(
        &server.addr,
        &format!("/grid/children?gid={}", server.gids[4]),
    )
    .await
    .unwrap();
    assert_eq!(body["parent"], server.gids[4].as_str());
    assert_eq!(body["target_size"], 5);
    assert_eq!(body["count"], 100);
    assert_eq!(body["truncated"], false);

    let (status, kind) = error_kind(
        &server.addr,
        &format!("/grid/children?gid={}&size=7", server.gids[4]),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(kind, "invalid_parameter");
}

#[tokio::test]
async fn test_grid_polyfill() {
    let server = start_test_server().await;
    let first: Value = http_client::get_json(
        &server.addr,
        &format!("/grid/gid-to-bound?gid={}", server.gids[0]),
    )
    .await
    .unwrap();
    let last: Value = http_client::get_json(
        &server.addr,
        &format!("/grid/gid-to-bound?gid={}", server.gids[8]),
    )
    .await
    .unwrap();
    let (min_lon, min_lat) = (first["min_lon"].as_f64().unwrap(), first["min_lat"].as_f64().unwrap());
    let (max_lon, max_lat) = (last["max_lon"].as_f64().unwrap(), last["max_lat"].as_f64().unwrap());
    let ring = json!([
        [min_lon + 1e-6, min_lat + 1e-6],
        [max_lon - 1e-6, min_lat + 1e-6],
        [max_lon - 1e-6, max_lat - 1e-6],
        [min_lon + 1e-6, max_lat - 1e-6],
        [min_lon + 1e-6, min_lat + 1e-6],
    ]);

    let partial: Value = http_client::post_json_ok(
        &server.addr,
        "/grid/polyfill",
        &json!({"coordinates": ring, "size": 50, "fullcover": false}),
    )
    .await
    .unwrap();
    assert_eq!(partial["count"], 9);

    let full: Value = http_client::post_json_ok(
        &server.addr,
        "/grid/polyfill",
        &json!({"coordinates": ring, "size": 50}),
    )
    .await
    .unwrap();
    // Only the center cell lies fully inside the shrunken ring
    assert_eq!(full["count"], 1);
    assert_eq!(full["gids"][0], server.gids[4].as_str());
}
