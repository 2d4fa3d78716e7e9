//! Inverse distance weighting.
//!
//! ```text
//! z = Σ(wi * zi) / Σ(wi)    with    wi = 1 / di^p
//! ```
//!
//! A neighbour closer than the direct-hit distance short-circuits the
//! weighting and its stored value is returned unchanged.

use super::{round_to, Estimator, Neighbor};

/// IDW estimator
#[derive(Debug, Clone, Copy)]
pub struct IdwEstimator {
    power: f64,
    direct_hit_distance_m: f64,
    precision: u32,
}

impl IdwEstimator {
    pub fn new(power: f64, direct_hit_distance_m: f64, precision: u32) -> Self {
        Self {
            power,
            direct_hit_distance_m,
            precision,
        }
    }
}

impl Default for IdwEstimator {
    fn default() -> Self {
        Self::new(2.0, 1.0, 4)
    }
}

impl Estimator for IdwEstimator {
    fn estimate(&self, neighbors: &[Neighbor<'_>]) -> Option<f64> {
        let nearest = neighbors.first()?;

        if nearest.distance_m < self.direct_hit_distance_m || nearest.distance_m <= 0.0 {
            return Some(nearest.value);
        }

        // Neighbours are sorted, so every distance past this point is positive
        let (weighted_sum, total_weight) =
            neighbors
                .iter()
                .fold((0.0, 0.0), |(sum, total), n| {
                    let w = 1.0 / n.distance_m.powf(self.power);
                    (sum + w * n.value, total + w)
                });

        Some(round_to(weighted_sum / total_weight, self.precision))
    }

    fn name(&self) -> &str {
        "idw"
    }
}
