//! Cell store: the known cell values the interpolation is anchored on.
//!
//! Built once from the loaded rows and never mutated afterwards. Each kept
//! cell gets a dense handle (its position in the cell vector) which is also
//! the key the spatial index stores.

use std::collections::HashMap;

use crate::data_loader::CellRow;
use crate::error::{GridscaleError, Result};
use crate::grid::{Bounds, GridSystem};

/// A cell with a measured value
#[derive(Debug, Clone, PartialEq)]
pub struct KnownCell {
    pub gid: String,
    pub value: f64,
    /// (lon, lat) of the cell's bounding box midpoint
    pub centroid: (f64, f64),
}

/// Counters collected while building the store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    pub rows_read: usize,
    pub missing_values: usize,
    pub duplicates: usize,
}

/// Read-only snapshot of all known cells
#[derive(Debug, Clone, Default)]
pub struct CellStore {
    cells: Vec<KnownCell>,
    handles: HashMap<String, usize>,
    coverage: Option<Bounds>,
    /// Largest cell width and height in degrees
    cell_extent: (f64, f64),
    stats: LoadStats,
}

impl CellStore {
    /// Build the store from raw rows.
    ///
    /// Rows without a value are skipped. A repeated identifier replaces the
    /// earlier value but keeps its handle. Coverage grows by each kept cell's
    /// full bounding box, so points inside an edge cell are never rejected.
    pub fn from_rows<I>(rows: I, grid: &dyn GridSystem) -> Result<Self>
    where
        I: IntoIterator<Item = CellRow>,
    {
        let mut store = CellStore::default();

        for row in rows {
            store.stats.rows_read += 1;

            let Some(value) = row.value else {
                store.stats.missing_values += 1;
                continue;
            };

            let bounds = grid
                .identifier_to_bounds(&row.gid)
                .map_err(|e| GridscaleError::Load {
                    message: format!("row {}: {}", store.stats.rows_read, e),
                })?;

            match store.coverage.as_mut() {
                Some(coverage) => coverage.expand(&bounds),
                None => store.coverage = Some(bounds),
            }
            store.cell_extent.0 = store.cell_extent.0.max(bounds.max_lon - bounds.min_lon);
            store.cell_extent.1 = store.cell_extent.1.max(bounds.max_lat - bounds.min_lat);

            let cell = KnownCell {
                centroid: bounds.center(),
                gid: row.gid,
                value,
            };

            match store.handles.get(&cell.gid) {
                Some(&handle) => {
                    store.stats.duplicates += 1;
                    store.cells[handle] = cell;
                }
                None => {
                    store.handles.insert(cell.gid.clone(), store.cells.len());
                    store.cells.push(cell);
                }
            }
        }

        Ok(store)
    }

    /// All cells, indexed by handle
    pub fn cells(&self) -> &[KnownCell] {
        &self.cells
    }

    /// Cell behind a handle handed out by the spatial index
    pub fn by_handle(&self, handle: usize) -> Option<&KnownCell> {
        self.cells.get(handle)
    }

    pub fn get(&self, gid: &str) -> Option<&KnownCell> {
        self.handles.get(gid).map(|&h| &self.cells[h])
    }

    /// Stored value of a cell, `None` when the cell has no data
    pub fn value(&self, gid: &str) -> Option<f64> {
        self.get(gid).map(|c| c.value)
    }

    /// Bounding box of every kept cell; `None` for an empty store
    pub fn coverage(&self) -> Option<&Bounds> {
        self.coverage.as_ref()
    }

    /// Inclusive coverage test. An empty store covers nothing.
    pub fn is_within_coverage(&self, lon: f64, lat: f64) -> bool {
        self.coverage
            .as_ref()
            .is_some_and(|b| b.contains(lon, lat))
    }

    /// Largest (width, height) of any kept cell, in degrees
    pub fn cell_extent(&self) -> (f64, f64) {
        self.cell_extent
    }

    pub fn stats(&self) -> LoadStats {
        self.stats
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}
