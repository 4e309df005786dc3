//! Floor decision and beacon state classification

use crate::algorithms::distance::{estimate_distance, is_usable};
use crate::core::{
    BeaconClassification, BeaconRange, BeaconTag, CalibrationModel, Observation,
    MAX_RELEVANT_DISTANCE_M,
};
use crate::sources::Catalog;
use crate::validation::DataValidator;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

/// How the candidate floor of a batch is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FloorPolicy {
    /// Floor of the closest surviving beacon
    #[default]
    ClosestBeacon,
    /// Most common floor among surviving beacons, ties go to the closest
    MajorityVote,
}

/// Where the per-observation distance comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceSource {
    /// Always derive distance from RSSI
    #[default]
    Rssi,
    /// Use the scanner's reported distance when present
    PreferReported,
}

/// Result of classifying one batch
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationOutcome {
    pub detected: BTreeSet<String>,
    /// Resolved current floor (sticky)
    pub floor: Option<i32>,
    pub classification: BeaconClassification,
    /// Known, in-range, de-duplicated observations, closest first
    pub ranges: Vec<BeaconRange>,
}

/// Pure floor and proximity classifier. Floor history is threaded in by
/// the caller through `previous_floor`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProximityClassifier {
    pub calibration: CalibrationModel,
    pub max_relevant_distance_m: f64,
    pub floor_policy: FloorPolicy,
    pub distance_source: DistanceSource,
}

impl Default for ProximityClassifier {
    fn default() -> Self {
        Self::new(CalibrationModel::default(), MAX_RELEVANT_DISTANCE_M)
    }
}

impl ProximityClassifier {
    pub fn new(calibration: CalibrationModel, max_relevant_distance_m: f64) -> Self {
        Self {
            calibration,
            max_relevant_distance_m,
            floor_policy: FloorPolicy::default(),
            distance_source: DistanceSource::default(),
        }
    }

    pub fn with_floor_policy(mut self, policy: FloorPolicy) -> Self {
        self.floor_policy = policy;
        self
    }

    pub fn with_distance_source(mut self, source: DistanceSource) -> Self {
        self.distance_source = source;
        self
    }

    /// Distance in meters for one observation under the configured source
    pub fn observation_distance(&self, observation: &Observation) -> f64 {
        match (self.distance_source, observation.reported_distance) {
            (DistanceSource::PreferReported, Some(reported)) if is_usable(reported) => reported,
            _ => estimate_distance(observation.rssi, &self.calibration),
        }
    }

    /// Drop malformed, unknown and out-of-range observations and keep the
    /// closest reading per beacon
    pub fn usable_ranges(&self, observations: &[Observation], catalog: &Catalog) -> Vec<BeaconRange> {
        let validator = DataValidator::new();
        let mut closest: HashMap<&str, BeaconRange> = HashMap::new();

        for observation in observations {
            if let Err(error) = validator.validate_observation(observation) {
                debug!(%error, "dropping malformed observation");
                continue;
            }

            let Some(record) = catalog.get(&observation.beacon_id) else {
                continue;
            };

            let distance_m = self.observation_distance(observation);
            if !is_usable(distance_m) || distance_m > self.max_relevant_distance_m {
                continue;
            }

            let candidate = BeaconRange {
                beacon_id: record.id.clone(),
                rssi: observation.rssi,
                distance_m,
                floor_id: record.floor_id,
            };

            closest
                .entry(record.id.as_str())
                .and_modify(|current| {
                    if candidate.distance_m < current.distance_m {
                        *current = candidate.clone();
                    }
                })
                .or_insert(candidate);
        }

        let mut ranges: Vec<BeaconRange> = closest.into_values().collect();
        ranges.sort_by(|a, b| {
            a.distance_m
                .total_cmp(&b.distance_m)
                .then_with(|| a.beacon_id.cmp(&b.beacon_id))
        });
        ranges
    }

    /// Candidate floor for a batch of ranges sorted closest first
    fn candidate_floor(&self, ranges: &[BeaconRange]) -> Option<i32> {
        let closest = ranges.first()?.floor_id;

        match self.floor_policy {
            FloorPolicy::ClosestBeacon => Some(closest),
            FloorPolicy::MajorityVote => {
                let mut votes: BTreeMap<i32, usize> = BTreeMap::new();
                for range in ranges {
                    *votes.entry(range.floor_id).or_default() += 1;
                }
                let best = votes.values().copied().max().unwrap_or(0);
                // Ranges are sorted, so the first tied floor belongs to the closest beacon
                ranges
                    .iter()
                    .map(|r| r.floor_id)
                    .find(|floor| votes.get(floor) == Some(&best))
                    .or(Some(closest))
            }
        }
    }

    /// Classify one observation batch against the catalog
    pub fn classify(
        &self,
        observations: &[Observation],
        catalog: &Catalog,
        previous_floor: Option<i32>,
    ) -> ClassificationOutcome {
        let ranges = self.usable_ranges(observations, catalog);
        let candidate = self.candidate_floor(&ranges);

        let detected: BTreeSet<String> = ranges
            .iter()
            .filter(|r| candidate.map_or(true, |floor| r.floor_id == floor))
            .map(|r| r.beacon_id.clone())
            .collect();

        let floor = candidate.or(previous_floor);

        let tags = catalog
            .records()
            .map(|record| {
                let tag = if detected.contains(&record.id) {
                    BeaconTag::Detected
                } else if floor == Some(record.floor_id) {
                    BeaconTag::SameFloor
                } else {
                    BeaconTag::Other
                };
                (record.id.clone(), tag)
            })
            .collect();

        debug!(
            observed = observations.len(),
            usable = ranges.len(),
            detected = detected.len(),
            candidate = ?candidate,
            floor = ?floor,
            "batch classified"
        );

        ClassificationOutcome {
            detected,
            floor,
            classification: BeaconClassification::from_tags(tags),
            ranges,
        }
    }
}
