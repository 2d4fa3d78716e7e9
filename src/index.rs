//! Spatial index over cell centroids.
//!
//! An R-tree bulk loaded once from the cell store. Points are stored as plain
//! (lon, lat) pairs, so the tree ranks candidates by planar degree distance;
//! callers that need metres re-rank the candidates themselves.

use rstar::primitives::GeomWithData;
use rstar::{RTree, AABB};

use crate::store::KnownCell;

/// Centroid tagged with the cell's handle in the store
type IndexedPoint = GeomWithData<[f64; 2], usize>;

/// Immutable nearest-neighbour index
#[derive(Debug)]
pub struct SpatialIndex {
    tree: RTree<IndexedPoint>,
}

impl SpatialIndex {
    /// Bulk load the index. Handle `i` refers to `cells[i]`.
    pub fn build(cells: &[KnownCell]) -> Self {
        let points = cells
            .iter()
            .enumerate()
            .map(|(handle, cell)| GeomWithData::new([cell.centroid.0, cell.centroid.1], handle))
            .collect();

        Self {
            tree: RTree::bulk_load(points),
        }
    }

    /// Handles of up to `k` centroids closest to (lon, lat), nearest first
    pub fn nearest(&self, lon: f64, lat: f64, k: usize) -> Vec<usize> {
        self.tree
            .nearest_neighbor_iter(&[lon, lat])
            .take(k)
            .map(|p| p.data)
            .collect()
    }

    /// Handles of all centroids inside the box, edges included
    pub fn within(&self, min: [f64; 2], max: [f64; 2]) -> Vec<usize> {
        self.tree
            .locate_in_envelope(&AABB::from_corners(min, max))
            .map(|p| p.data)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}
