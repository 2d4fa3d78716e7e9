//! Grid addressing.
//!
//! Maps between geographic coordinates and hierarchical cell identifiers
//! (GIDs). The interpolation engine only talks to the [`GridSystem`] trait;
//! [`SquareGrid`] is the implementation the server ships with.

pub mod square;

use geo::Polygon;
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use square::SquareGrid;

/// Finest supported level
pub const MAX_LEVEL: u8 = 15;

/// Nominal cell size in metres for each level, coarsest first
pub const LEVEL_SIZES_M: [u64; MAX_LEVEL as usize] = [
    10_000_000, 5_000_000, 1_000_000, 500_000, 100_000, 50_000, 10_000, 5_000, 1_000, 500, 100,
    50, 10, 5, 1,
];

/// Level whose nominal cell size is `size_m` metres
pub fn level_for_size(size_m: u64) -> Option<u8> {
    LEVEL_SIZES_M
        .iter()
        .position(|&s| s == size_m)
        .map(|i| i as u8 + 1)
}

/// Nominal cell size in metres of a level
pub fn size_for_level(level: u8) -> Option<u64> {
    if level == 0 {
        return None;
    }
    LEVEL_SIZES_M.get(level as usize - 1).copied()
}

/// Axis-aligned box in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl Bounds {
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        }
    }

    /// Midpoint as (lon, lat)
    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_lon + self.max_lon) / 2.0,
            (self.min_lat + self.max_lat) / 2.0,
        )
    }

    /// Inclusive on every edge
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        self.min_lon <= lon && lon <= self.max_lon && self.min_lat <= lat && lat <= self.max_lat
    }

    /// Grow this box to cover `other`
    pub fn expand(&mut self, other: &Bounds) {
        self.min_lon = self.min_lon.min(other.min_lon);
        self.min_lat = self.min_lat.min(other.min_lat);
        self.max_lon = self.max_lon.max(other.max_lon);
        self.max_lat = self.max_lat.max(other.max_lat);
    }

    /// Closed exterior ring, counter-clockwise from the lower-left corner
    pub fn to_polygon(&self) -> Polygon<f64> {
        geo::Rect::new(
            geo::coord! { x: self.min_lon, y: self.min_lat },
            geo::coord! { x: self.max_lon, y: self.max_lat },
        )
        .to_polygon()
    }
}

/// A hierarchical grid addressing system.
///
/// Implementations must be immutable once constructed; the engine calls them
/// concurrently from every request.
pub trait GridSystem: Send + Sync {
    /// Identifier of the cell containing the coordinate at `level`
    fn coordinate_to_identifier(&self, lon: f64, lat: f64, level: u8) -> Result<String>;

    /// Bounding box of a cell
    fn identifier_to_bounds(&self, gid: &str) -> Result<Bounds>;

    /// Centre of a cell as (lon, lat)
    fn identifier_to_centroid(&self, gid: &str) -> Result<(f64, f64)> {
        Ok(self.identifier_to_bounds(gid)?.center())
    }

    /// Lower-left corner of a cell as (lon, lat)
    fn identifier_to_origin(&self, gid: &str) -> Result<(f64, f64)> {
        let b = self.identifier_to_bounds(gid)?;
        Ok((b.min_lon, b.min_lat))
    }

    /// All descendants of `gid` at `target_level`
    fn children(&self, gid: &str, target_level: u8) -> Result<Vec<String>>;

    /// Cells at `level` covering the polygon. With `full_cover` only cells
    /// entirely inside the polygon are returned, otherwise every cell that
    /// intersects it.
    fn polyfill(&self, polygon: &Polygon<f64>, level: u8, full_cover: bool) -> Result<Vec<String>>;
}
