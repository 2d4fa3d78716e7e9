//! Interpolation from known cells to arbitrary points.
//!
//! A query first collects the nearest known cells ([`neighbors`]) and then
//! hands them to an [`Estimator`] that turns them into a single value.

pub mod idw;
pub mod nearest;
pub mod neighbors;

use serde::Serialize;

use crate::config::InterpolationConfig;
use crate::error::{GridscaleError, Result};

pub use idw::IdwEstimator;
pub use nearest::NearestEstimator;
pub use neighbors::find_neighbors;

/// Mean Earth radius used for great-circle distances
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A known cell near a query point
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Neighbor<'a> {
    pub gid: &'a str,
    pub value: f64,
    pub distance_m: f64,
}

/// Trait for estimation methods
pub trait Estimator: Send + Sync {
    /// Estimate a value from neighbours sorted by ascending distance.
    /// `None` means there is nothing to estimate from.
    fn estimate(&self, neighbors: &[Neighbor<'_>]) -> Option<f64>;

    /// Get the name of this estimation method
    fn name(&self) -> &str;
}

/// Get an estimator for the configured method
pub fn get_estimator(config: &InterpolationConfig) -> Result<Box<dyn Estimator>> {
    match config.method.to_lowercase().as_str() {
        "idw" => Ok(Box::new(IdwEstimator::new(
            config.power,
            config.direct_hit_distance_m,
            config.precision,
        ))),
        "nearest" => Ok(Box::new(NearestEstimator)),
        _ => Err(GridscaleError::InvalidParameter {
            param: "method".to_string(),
            message: format!("Unknown interpolation method: {}", config.method),
        }),
    }
}

/// Great-circle distance in metres between two (lon, lat) points
pub fn haversine_distance(lon1: f64, lat1: f64, lon2: f64, lat2: f64) -> f64 {
    let (lat1_r, lat2_r) = (lat1.to_radians(), lat2.to_radians());
    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();

    let a = (dlat / 2.0).sin().powi(2) + lat1_r.cos() * lat2_r.cos() * (dlon / 2.0).sin().powi(2);
    EARTH_RADIUS_M * 2.0 * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Round half away from zero to `decimals` places
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let scale = 10f64.powi(decimals as i32);
    (value * scale).round() / scale
}
