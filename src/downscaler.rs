//! Query façade over the cell store, spatial index and estimator.
//!
//! A [`Downscaler`] is built in one step (load rows, build the store, bulk load
//! the index, pick the estimator) and is read-only afterwards, so any number
//! of requests can query it concurrently without locking. Refreshing the data
//! means building a new instance and swapping the shared handle.

use geo::{BoundingRect, Intersects, Polygon};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use crate::config::{DataConfig, InterpolationConfig};
use crate::data_loader::{read_parquet, CellRow};
use crate::error::{GridscaleError, Result};
use crate::grid::{Bounds, GridSystem};
use crate::index::SpatialIndex;
use crate::interpolation::{find_neighbors, get_estimator, round_to, Estimator, Neighbor};
use crate::logging::log_timed_operation;
use crate::store::{CellStore, LoadStats};

/// Where a reported value comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueSource {
    /// Stored value of a source-level cell
    Original,
    /// Estimated from neighbouring source-level cells
    Interpolated,
}

/// Result of a coordinate or identifier query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointValue {
    pub gid: String,
    pub level: u8,
    /// `None` when no data exists for the query; this is not an error
    pub value: Option<f64>,
    pub source: ValueSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
}

/// Mean of the stored values inside a polygon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolygonAggregate {
    /// Cells that intersect the polygon and have data
    pub cell_count: usize,
    pub avg_value: Option<f64>,
}

/// Immutable interpolation service
pub struct Downscaler {
    store: CellStore,
    index: SpatialIndex,
    grid: Arc<dyn GridSystem>,
    settings: InterpolationConfig,
    estimator: Box<dyn Estimator>,
}

impl fmt::Debug for Downscaler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Downscaler")
            .field("cells", &self.store.len())
            .field("coverage", &self.store.coverage())
            .field("method", &self.estimator.name())
            .field("settings", &self.settings)
            .finish()
    }
}

impl Downscaler {
    /// Load a parquet dataset and build the service
    pub fn load(
        path: &Path,
        data: &DataConfig,
        grid: Arc<dyn GridSystem>,
        settings: InterpolationConfig,
    ) -> Result<Self> {
        let rows = read_parquet(path, &data.gid_column, &data.value_column).map_err(|e| match e {
            GridscaleError::Load { .. } => e,
            other => GridscaleError::Load {
                message: format!("{}: {}", path.display(), other),
            },
        })?;
        Self::build(rows, grid, settings)
    }

    /// Build the service from rows that are already in memory
    pub fn build<I>(rows: I, grid: Arc<dyn GridSystem>, settings: InterpolationConfig) -> Result<Self>
    where
        I: IntoIterator<Item = CellRow>,
    {
        settings.validate()?;
        let estimator = get_estimator(&settings)?;

        let store = CellStore::from_rows(rows, grid.as_ref())?;
        let index = log_timed_operation("build_spatial_index", || {
            SpatialIndex::build(store.cells())
        });

        Ok(Self {
            store,
            index,
            grid,
            settings,
            estimator,
        })
    }

    pub fn store(&self) -> &CellStore {
        &self.store
    }

    pub fn grid(&self) -> &dyn GridSystem {
        self.grid.as_ref()
    }

    pub fn settings(&self) -> &InterpolationConfig {
        &self.settings
    }

    pub fn method(&self) -> &str {
        self.estimator.name()
    }

    pub fn cell_count(&self) -> usize {
        self.store.len()
    }

    pub fn coverage(&self) -> Option<&Bounds> {
        self.store.coverage()
    }

    pub fn load_stats(&self) -> LoadStats {
        self.store.stats()
    }

    /// Levels accepted by [`Downscaler::value_at_gid`]
    pub fn supported_levels(&self) -> Vec<u8> {
        vec![self.settings.source_level, self.settings.target_level]
    }

    /// Nearest known cells, closest first
    pub fn neighbors(&self, lon: f64, lat: f64) -> Vec<Neighbor<'_>> {
        find_neighbors(&self.store, &self.index, lon, lat, self.settings.neighbors)
    }

    /// Estimate at a point without any coverage check
    pub fn interpolate(&self, lon: f64, lat: f64) -> Option<f64> {
        let neighbors = self.neighbors(lon, lat);
        debug!(lon, lat, neighbors = neighbors.len(), "Interpolating");
        self.estimator.estimate(&neighbors)
    }

    /// Value at a coordinate, reported for its target-level cell
    pub fn value_at_coord(&self, lon: f64, lat: f64) -> Result<PointValue> {
        if !self.store.is_within_coverage(lon, lat) {
            return Err(GridscaleError::OutOfCoverage { lon, lat });
        }

        let level = self.settings.target_level;
        let gid = self.grid.coordinate_to_identifier(lon, lat, level)?;

        Ok(PointValue {
            gid,
            level,
            value: self.interpolate(lon, lat),
            source: ValueSource::Interpolated,
            lon: Some(lon),
            lat: Some(lat),
        })
    }

    /// Value of a cell. Source-level cells are looked up directly; target-level
    /// cells are interpolated at their centre.
    pub fn value_at_gid(&self, gid: &str) -> Result<PointValue> {
        let level = gid.chars().count();

        if level == self.settings.source_level as usize {
            Ok(PointValue {
                gid: gid.to_string(),
                level: self.settings.source_level,
                value: self.store.value(gid),
                source: ValueSource::Original,
                lon: None,
                lat: None,
            })
        } else if level == self.settings.target_level as usize {
            let (lon, lat) = self.grid.identifier_to_centroid(gid)?;
            Ok(PointValue {
                gid: gid.to_string(),
                level: self.settings.target_level,
                value: self.interpolate(lon, lat),
                source: ValueSource::Interpolated,
                lon: None,
                lat: None,
            })
        } else {
            Err(GridscaleError::UnsupportedLevel {
                level,
                supported: self.supported_levels(),
            })
        }
    }

    /// Mean stored value of the known cells intersecting a polygon.
    /// Cells without data are left out rather than counted as zero.
    ///
    /// Candidates come from the spatial index, so the cost follows the data
    /// inside the polygon rather than the number of grid cells it spans.
    pub fn polygon_aggregate(&self, polygon: &Polygon<f64>) -> Result<PolygonAggregate> {
        let Some(rect) = polygon.bounding_rect() else {
            return Ok(PolygonAggregate {
                cell_count: 0,
                avg_value: None,
            });
        };

        // A centroid sits at most one cell extent from any part of its box
        let (dx, dy) = self.store.cell_extent();
        let candidates = self.index.within(
            [rect.min().x - dx, rect.min().y - dy],
            [rect.max().x + dx, rect.max().y + dy],
        );

        let mut values = Vec::new();
        for handle in &candidates {
            let Some(cell) = self.store.by_handle(*handle) else {
                continue;
            };
            let bounds = self.grid.identifier_to_bounds(&cell.gid)?;
            if polygon.intersects(&bounds.to_polygon()) {
                values.push(cell.value);
            }
        }
        debug!(
            candidates = candidates.len(),
            with_data = values.len(),
            "Aggregating polygon"
        );

        let avg_value = if values.is_empty() {
            None
        } else {
            let mean = values.iter().sum::<f64>() / values.len() as f64;
            Some(round_to(mean, self.settings.precision))
        };

        Ok(PolygonAggregate {
            cell_count: values.len(),
            avg_value,
        })
    }
}
