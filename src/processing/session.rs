//! Scan session state machine
//!
//! `Idle --start(ready)--> Scanning`, `Scanning --stop()/interrupt()--> Idle`.
//! Observation batches only have an effect while scanning. Every accepted
//! transition or batch produces a new immutable [`EngineSnapshot`]; no-op
//! calls produce nothing and leave the last snapshot in place.

use crate::algorithms::{ProximityClassifier, RangeSample, WeightedCentroid};
use crate::core::{
    BeaconClassification, BeaconRange, EngineSnapshot, FloorState, Observation, Position,
};
use crate::sources::Catalog;
use crate::utils::EngineConfig;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionState {
    Idle,
    Scanning,
}

/// Why `start` did not transition to scanning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StartRejection {
    #[error("Scanning already in progress")]
    AlreadyScanning,
    #[error("Bluetooth or location services are not available")]
    NotReady,
}

/// Counters over the lifetime of a session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    pub batches_processed: u64,
    pub batches_ignored: u64,
    pub observations_seen: u64,
    pub observations_used: u64,
    pub snapshots_published: u64,
}

/// Single-owner scan session. Callers needing shared access wrap it in the
/// engine, which serialises every mutating call.
#[derive(Debug)]
pub struct ScanSession {
    catalog: Arc<Catalog>,
    estimator: WeightedCentroid,
    classifier: ProximityClassifier,
    state: SessionState,
    position: Position,
    floor: Option<i32>,
    snapshot: Arc<EngineSnapshot>,
    stats: SessionStats,
}

impl ScanSession {
    pub fn new(catalog: Arc<Catalog>, config: &EngineConfig) -> Self {
        let position = config.initial_position;
        let snapshot = Arc::new(EngineSnapshot {
            sequence: 0,
            position,
            floor: FloorState::unknown(),
            classification: BeaconClassification::all_other(catalog.ids()),
            scanning: false,
            ranges: Vec::new(),
        });

        Self {
            catalog,
            estimator: config.position_estimator(),
            classifier: config.classifier(),
            state: SessionState::Idle,
            position,
            floor: None,
            snapshot,
            stats: SessionStats::default(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_scanning(&self) -> bool {
        self.state == SessionState::Scanning
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> Arc<EngineSnapshot> {
        Arc::clone(&self.snapshot)
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// Begin scanning. `ready` is the caller's view of radio and
    /// positioning availability.
    pub fn start(&mut self, ready: bool) -> Result<Arc<EngineSnapshot>, StartRejection> {
        if self.is_scanning() {
            return Err(StartRejection::AlreadyScanning);
        }
        if !ready {
            return Err(StartRejection::NotReady);
        }

        self.state = SessionState::Scanning;
        info!("scanning started");
        Ok(self.publish_idle_classification())
    }

    /// Stop scanning, keeping position and floor as last known.
    /// Returns `None` when already idle.
    pub fn stop(&mut self) -> Option<Arc<EngineSnapshot>> {
        if !self.is_scanning() {
            return None;
        }

        self.state = SessionState::Idle;
        info!("scanning stopped");
        Some(self.publish_idle_classification())
    }

    /// Forced stop after the radio or positioning capability went away
    pub fn interrupt(&mut self, reason: &str) -> Option<Arc<EngineSnapshot>> {
        if !self.is_scanning() {
            return None;
        }

        warn!(reason, "scanning interrupted");
        self.state = SessionState::Idle;
        Some(self.publish_idle_classification())
    }

    /// Process one observation batch. Batches arriving while idle are
    /// stale callbacks and are discarded.
    pub fn on_observation_batch(&mut self, batch: &[Observation]) -> Option<Arc<EngineSnapshot>> {
        if !self.is_scanning() {
            self.stats.batches_ignored += 1;
            debug!(observations = batch.len(), "batch ignored while idle");
            return None;
        }

        let outcome = self.classifier.classify(batch, &self.catalog, self.floor);

        let samples: Vec<RangeSample> = outcome
            .ranges
            .iter()
            .filter_map(|range| {
                self.catalog
                    .get(&range.beacon_id)
                    .map(|record| RangeSample::new(record.latitude, record.longitude, range.distance_m))
            })
            .collect();

        self.position = self.estimator.estimate(&samples, self.position);
        self.floor = outcome.floor;

        self.stats.batches_processed += 1;
        self.stats.observations_seen += batch.len() as u64;
        self.stats.observations_used += outcome.ranges.len() as u64;

        debug!(
            lat = self.position.lat,
            lon = self.position.lon,
            floor = ?self.floor,
            usable = outcome.ranges.len(),
            "position updated"
        );

        Some(self.publish(outcome.classification, outcome.ranges))
    }

    fn publish_idle_classification(&mut self) -> Arc<EngineSnapshot> {
        let classification = BeaconClassification::all_other(self.catalog.ids());
        self.publish(classification, Vec::new())
    }

    fn publish(
        &mut self,
        classification: BeaconClassification,
        ranges: Vec<BeaconRange>,
    ) -> Arc<EngineSnapshot> {
        let snapshot = Arc::new(EngineSnapshot {
            sequence: self.snapshot.sequence + 1,
            position: self.position,
            floor: FloorState {
                current: self.floor,
            },
            classification,
            scanning: self.is_scanning(),
            ranges,
        });

        self.stats.snapshots_published += 1;
        self.snapshot = Arc::clone(&snapshot);
        snapshot
    }
}
