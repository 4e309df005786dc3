//! Indoor Beacon Positioning
//!
//! Estimates a device's position and floor from BLE beacon observations
//! against a catalog of surveyed reference beacons, and classifies every
//! catalog beacon as detected, on the current floor, or elsewhere.

pub mod core;
pub mod algorithms;
pub mod processing;
pub mod validation;
pub mod utils;
pub mod sources;
pub mod api;

// Re-export commonly used types
pub use core::{
    BeaconClassification, BeaconRange, BeaconRecord, BeaconTag, CalibrationModel, EngineSnapshot,
    FloorState, Observation, Position,
};
pub use algorithms::{
    estimate_distance, range_ring, DistanceSource, DistanceWeighting, FloorPolicy,
    ProximityClassifier, SingleBeaconPolicy, WeightedCentroid,
};
pub use processing::{ScanSession, SessionState, SessionStats, StartRejection};
pub use sources::{
    Catalog, CatalogAdvisory, CatalogError, CatalogLoad, CatalogLoader, JsonCatalogFiles,
    ObservationSource, QueuedObservationSource, ReplayScript, StaticCatalog,
};
pub use utils::{ConfigError, EngineConfig};
pub use api::{
    CallbackHandle, EngineError, EngineEvent, EngineMailbox, EngineResult, MailboxHandle, Notice,
    PositioningEngine,
};
