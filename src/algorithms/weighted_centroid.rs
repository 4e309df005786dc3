//! Inverse-distance weighted centroid position estimation
//!
//! Each usable beacon pulls the estimate toward its own coordinates with
//! weight `1 / max(d, d_min)^p`. This is not a multilateration solve: the
//! result always lies inside the convex hull of the contributing beacons.

use crate::algorithms::distance::is_usable;
use crate::core::{Position, MIN_BEACON_DISTANCE_M};
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Beacon coordinates paired with an estimated distance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeSample {
    pub lat: f64,
    pub lon: f64,
    pub distance_m: f64,
}

impl RangeSample {
    pub fn new(lat: f64, lon: f64, distance_m: f64) -> Self {
        Self {
            lat,
            lon,
            distance_m,
        }
    }

    fn is_usable(&self) -> bool {
        self.lat.is_finite() && self.lon.is_finite() && is_usable(self.distance_m)
    }
}

/// Exponent applied to distance when weighting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceWeighting {
    /// p = 1
    Inverse,
    /// p = 2, sharper locality
    #[default]
    InverseSquare,
}

impl DistanceWeighting {
    fn weight(self, distance_m: f64) -> f64 {
        match self {
            DistanceWeighting::Inverse => 1.0 / distance_m,
            DistanceWeighting::InverseSquare => 1.0 / (distance_m * distance_m),
        }
    }
}

/// What to do when only one beacon is usable.
///
/// A single range cannot tell direction, so by default the previous
/// position is held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SingleBeaconPolicy {
    #[default]
    HoldPrevious,
    MoveToBeacon,
}

/// Weighted centroid estimator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightedCentroid {
    pub min_distance_m: f64,
    pub weighting: DistanceWeighting,
    pub single_beacon: SingleBeaconPolicy,
}

impl Default for WeightedCentroid {
    fn default() -> Self {
        Self::new(MIN_BEACON_DISTANCE_M)
    }
}

impl WeightedCentroid {
    pub fn new(min_distance_m: f64) -> Self {
        Self {
            min_distance_m,
            weighting: DistanceWeighting::default(),
            single_beacon: SingleBeaconPolicy::default(),
        }
    }

    pub fn with_weighting(mut self, weighting: DistanceWeighting) -> Self {
        self.weighting = weighting;
        self
    }

    pub fn with_single_beacon_policy(mut self, policy: SingleBeaconPolicy) -> Self {
        self.single_beacon = policy;
        self
    }

    fn distance_floor(&self) -> f64 {
        if self.min_distance_m.is_finite() && self.min_distance_m > 0.0 {
            self.min_distance_m
        } else {
            MIN_BEACON_DISTANCE_M
        }
    }

    /// Estimate the observer position.
    ///
    /// Returns `previous` unchanged when no sample is usable, and when
    /// exactly one is usable under [`SingleBeaconPolicy::HoldPrevious`].
    pub fn estimate(&self, samples: &[RangeSample], previous: Position) -> Position {
        let usable: Vec<&RangeSample> = samples.iter().filter(|s| s.is_usable()).collect();

        match usable.as_slice() {
            [] => return previous,
            [only] => match self.single_beacon {
                SingleBeaconPolicy::HoldPrevious => {
                    debug!("single usable beacon, holding previous position");
                    return previous;
                }
                SingleBeaconPolicy::MoveToBeacon => return Position::new(only.lat, only.lon),
            },
            _ => {}
        }

        let floor = self.distance_floor();
        let mut weighted = Vector2::<f64>::zeros();
        let mut total_weight = 0.0;

        for sample in usable {
            let weight = self.weighting.weight(sample.distance_m.max(floor));
            weighted += Vector2::new(sample.lat, sample.lon) * weight;
            total_weight += weight;
        }

        if !(total_weight > 0.0 && total_weight.is_finite()) {
            return previous;
        }

        let centroid = weighted / total_weight;
        let estimate = Position::new(centroid.x, centroid.y);
        if estimate.is_finite() {
            estimate
        } else {
            previous
        }
    }
}
