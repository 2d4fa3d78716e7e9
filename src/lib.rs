//! # gridscale
//!
//! An in-memory land value downscaling service.
//!
//! Known values are attached to coarse grid cells (around 50 m). This library
//! loads them from Parquet, indexes the cell centroids, and estimates values
//! for any coordinate or finer cell (around 5 m) by inverse distance
//! weighting over the nearest known cells.
//!
//! ## Architecture
//!
//! - **Grid**: hierarchical cell identifiers behind the [`GridSystem`] trait
//! - **Data Layer**: Parquet loading, the cell store and an R*-tree index
//! - **Engine**: neighbour search plus a pluggable estimator
//! - **API Layer**: an axum router over the immutable, shared [`Downscaler`]

pub mod config;
pub mod data_loader;
pub mod downscaler;
pub mod error;
pub mod geometry;
pub mod grid;
pub mod handlers;
pub mod index;
pub mod interpolation;
pub mod logging;
pub mod state;
pub mod store;

pub use config::Config;
pub use downscaler::{Downscaler, PointValue, PolygonAggregate, ValueSource};
pub use error::{GridscaleError, Result};
pub use grid::{Bounds, GridSystem, SquareGrid};
pub use handlers::router;
pub use logging::{
    create_http_trace_layer, generate_request_id, init_tracing, log_error, log_load_stats,
    log_operation_end, log_operation_start, log_request_error, log_timed_operation,
};
pub use state::AppState;
