//! Nearest neighbour estimation.
//!
//! Returns the stored value of the closest known cell. Produces blocky output
//! but never invents values that were not measured.

use super::{Estimator, Neighbor};

/// Nearest neighbour estimator
#[derive(Debug, Clone, Copy, Default)]
pub struct NearestEstimator;

impl Estimator for NearestEstimator {
    fn estimate(&self, neighbors: &[Neighbor<'_>]) -> Option<f64> {
        neighbors.first().map(|n| n.value)
    }

    fn name(&self) -> &str {
        "nearest"
    }
}
