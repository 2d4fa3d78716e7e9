//! k-nearest known cells around a point.
//!
//! The R-tree ranks by planar degree distance, which drifts from true ground
//! distance away from the equator. Candidates are therefore re-measured with
//! the haversine formula and re-sorted before anything is weighted.

use super::{haversine_distance, Neighbor};
use crate::index::SpatialIndex;
use crate::store::CellStore;

/// Up to `k` known cells nearest to (lon, lat), ascending by distance in metres.
/// Empty only when the store is empty.
pub fn find_neighbors<'a>(
    store: &'a CellStore,
    index: &SpatialIndex,
    lon: f64,
    lat: f64,
    k: usize,
) -> Vec<Neighbor<'a>> {
    let mut neighbors: Vec<Neighbor<'a>> = index
        .nearest(lon, lat, k)
        .into_iter()
        .filter_map(|handle| store.by_handle(handle))
        .map(|cell| Neighbor {
            gid: cell.gid.as_str(),
            value: cell.value,
            distance_m: haversine_distance(lon, lat, cell.centroid.0, cell.centroid.1),
        })
        .collect();

    neighbors.sort_by(|a, b| a.distance_m.total_cmp(&b.distance_m));
    neighbors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_loader::CellRow;
    use crate::error::Result;
    use crate::grid::{Bounds, GridSystem};
    use geo::Polygon;

    /// Grid where a cell's identifier spells out its centroid: "lon,lat"
    struct PointGrid;

    impl GridSystem for PointGrid {
        fn coordinate_to_identifier(&self, lon: f64, lat: f64, _level: u8) -> Result<String> {
            Ok(format!("{},{}", lon, lat))
        }

        fn identifier_to_bounds(&self, gid: &str) -> Result<Bounds> {
            let (lon, lat) = gid.split_once(',').unwrap();
            let (lon, lat): (f64, f64) = (lon.parse().unwrap(), lat.parse().unwrap());
            Ok(Bounds::new(lon - 1e-4, lat - 1e-4, lon + 1e-4, lat + 1e-4))
        }

        fn children(&self, _gid: &str, _target_level: u8) -> Result<Vec<String>> {
            Ok(Vec::new())
        }

        fn polyfill(&self, _polygon: &Polygon<f64>, _level: u8, _full_cover: bool) -> Result<Vec<String>> {
            Ok(Vec::new())
        }
    }

    fn build(points: &[(f64, f64, f64)]) -> (CellStore, SpatialIndex) {
        let rows = points
            .iter()
            .map(|&(lon, lat, v)| CellRow::new(format!("{},{}", lon, lat), Some(v)));
        let store = CellStore::from_rows(rows, &PointGrid).unwrap();
        let index = SpatialIndex::build(store.cells());
        (store, index)
    }

    #[test]
    fn test_sorted_by_ground_distance() {
        let (store, index) = build(&[(0.0, 0.0, 1.0), (0.002, 0.0, 2.0), (0.001, 0.0, 3.0)]);
        let found = find_neighbors(&store, &index, 0.0, 0.0, 3);

        let gids: Vec<&str> = found.iter().map(|n| n.gid).collect();
        assert_eq!(gids, vec!["0,0", "0.001,0", "0.002,0"]);
        assert!(found[0].distance_m < 1e-6);
        assert!((found[1].distance_m - 111.19).abs() < 0.01);
    }

    #[test]
    fn test_reranks_high_latitude_candidates() {
        // At 80°N a degree of longitude is ~5.7x shorter than a degree of
        // latitude, so the planar order and the ground order disagree.
        let (store, index) = build(&[(0.0, 80.001, 1.0), (0.004, 80.0, 2.0)]);
        let found = find_neighbors(&store, &index, 0.0, 80.0, 2);

        assert_eq!(found[0].gid, "0.004,80");
        assert!(found[0].distance_m < found[1].distance_m);
    }

    #[test]
    fn test_k_limits_results() {
        let (store, index) = build(&[(0.0, 0.0, 1.0), (1.0, 0.0, 2.0), (2.0, 0.0, 3.0)]);
        assert_eq!(find_neighbors(&store, &index, 0.0, 0.0, 2).len(), 2);
        assert_eq!(find_neighbors(&store, &index, 0.0, 0.0, 9).len(), 3);
    }

    #[test]
    fn test_empty_store_has_no_neighbors() {
        let (store, index) = build(&[]);
        assert!(find_neighbors(&store, &index, 0.0, 0.0, 9).is_empty());
    }
}
