//! Positioning algorithms

pub mod distance;
pub mod weighted_centroid;
pub mod proximity;
pub mod geodesy;

pub use distance::{estimate_distance, UNUSABLE_DISTANCE};
pub use weighted_centroid::{DistanceWeighting, RangeSample, SingleBeaconPolicy, WeightedCentroid};
pub use proximity::{ClassificationOutcome, DistanceSource, FloorPolicy, ProximityClassifier};
pub use geodesy::{range_ring, DEFAULT_RING_STEP_DEG};
