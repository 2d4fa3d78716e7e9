//! Polygon input handling and area measurement.

use geo::{GeodesicArea, LineString, Polygon};

use crate::error::{GridscaleError, Result};

/// Minimum number of positions in a closed ring
pub const MIN_RING_POSITIONS: usize = 4;

/// Build a polygon from `[lon, lat]` pairs. The ring is closed if needed.
pub fn polygon_from_coordinates(coordinates: &[[f64; 2]]) -> Result<Polygon<f64>> {
    if coordinates.len() < MIN_RING_POSITIONS {
        return Err(GridscaleError::InvalidPolygon {
            message: format!(
                "Polygon needs at least {} coordinate pairs, got {}",
                MIN_RING_POSITIONS,
                coordinates.len()
            ),
        });
    }

    for (i, &[lon, lat]) in coordinates.iter().enumerate() {
        if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
            return Err(GridscaleError::InvalidPolygon {
                message: format!("longitude {} at position {} is outside [-180, 180]", lon, i),
            });
        }
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(GridscaleError::InvalidPolygon {
                message: format!("latitude {} at position {} is outside [-90, 90]", lat, i),
            });
        }
    }

    let exterior: LineString<f64> = coordinates.iter().copied().collect();
    Ok(Polygon::new(exterior, vec![]))
}

/// Geodesic area on the WGS84 ellipsoid in square kilometres
pub fn area_km2(polygon: &Polygon<f64>) -> f64 {
    polygon.geodesic_area_unsigned() / 1_000_000.0
}
