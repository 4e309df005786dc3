//! Core data types for the positioning engine

use crate::core::constants::{
    DEFAULT_PATH_LOSS_EXPONENT, DEFAULT_TX_POWER_AT_1M, INITIAL_LATITUDE, INITIAL_LONGITUDE,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// 2D position in geodetic degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub lat: f64,
    pub lon: f64,
}

impl Position {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lon.is_finite()
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::new(INITIAL_LATITUDE, INITIAL_LONGITUDE)
    }
}

/// Static beacon record from the reference catalog.
///
/// Field names follow the catalog pages on disk. Only the identifier,
/// coordinates and floor are used by the engine; the rest is carried
/// through for the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BeaconRecord {
    /// Stable beacon identifier (Bluetooth address)
    #[serde(rename = "beaconUid")]
    pub id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub floor_id: i32,
    /// Row number in the catalog page
    #[serde(rename = "id", default, skip_serializing_if = "Option::is_none")]
    pub row_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_on_floor: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub building_short_name: Option<String>,
    #[serde(default)]
    pub room_placed: bool,
    #[serde(default)]
    pub near_floor_change: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_power_to_set: Option<i32>,
}

impl BeaconRecord {
    pub fn new(id: impl Into<String>, latitude: f64, longitude: f64, floor_id: i32) -> Self {
        Self {
            id: id.into(),
            latitude,
            longitude,
            floor_id,
            row_id: None,
            number_on_floor: None,
            building_short_name: None,
            room_placed: false,
            near_floor_change: false,
            tx_power_to_set: None,
        }
    }

    pub fn position(&self) -> Position {
        Position::new(self.latitude, self.longitude)
    }
}

/// One sighting of a beacon during a scan tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub beacon_id: String,
    /// Received signal strength (dBm)
    pub rssi: i32,
    /// Distance computed by the scanning stack, if it provides one (meters)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reported_distance: Option<f64>,
}

impl Observation {
    pub fn new(beacon_id: impl Into<String>, rssi: i32) -> Self {
        Self {
            beacon_id: beacon_id.into(),
            rssi,
            reported_distance: None,
        }
    }

    pub fn with_reported_distance(mut self, distance_m: f64) -> Self {
        self.reported_distance = Some(distance_m);
        self
    }
}

/// Log-distance path-loss calibration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationModel {
    /// Expected RSSI at one metre (dBm)
    pub tx_power_at_1m: f64,
    /// Environment-dependent attenuation factor
    pub path_loss_exponent: f64,
}

impl Default for CalibrationModel {
    fn default() -> Self {
        Self {
            tx_power_at_1m: DEFAULT_TX_POWER_AT_1M,
            path_loss_exponent: DEFAULT_PATH_LOSS_EXPONENT,
        }
    }
}

/// Current floor decision. `None` until the first candidate floor is seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FloorState {
    pub current: Option<i32>,
}

impl FloorState {
    pub fn unknown() -> Self {
        Self { current: None }
    }

    pub fn on(floor: i32) -> Self {
        Self {
            current: Some(floor),
        }
    }
}

/// Render state of a catalog beacon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BeaconTag {
    /// Seen in the latest batch on the current floor
    Detected,
    /// On the current floor but not seen
    SameFloor,
    Other,
}

/// Tag for every catalog beacon, keyed by beacon id
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BeaconClassification {
    tags: BTreeMap<String, BeaconTag>,
}

impl BeaconClassification {
    /// Every id tagged `Other`
    pub fn all_other<'a, I>(ids: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        Self {
            tags: ids
                .into_iter()
                .map(|id| (id.to_string(), BeaconTag::Other))
                .collect(),
        }
    }

    pub(crate) fn from_tags(tags: BTreeMap<String, BeaconTag>) -> Self {
        Self { tags }
    }

    pub fn tag(&self, id: &str) -> Option<BeaconTag> {
        self.tags.get(id).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, BeaconTag)> {
        self.tags.iter().map(|(id, tag)| (id.as_str(), *tag))
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn ids_tagged(&self, tag: BeaconTag) -> BTreeSet<&str> {
        self.iter()
            .filter(|(_, t)| *t == tag)
            .map(|(id, _)| id)
            .collect()
    }

    pub fn detected(&self) -> BTreeSet<&str> {
        self.ids_tagged(BeaconTag::Detected)
    }

    pub fn same_floor(&self) -> BTreeSet<&str> {
        self.ids_tagged(BeaconTag::SameFloor)
    }

    pub fn other(&self) -> BTreeSet<&str> {
        self.ids_tagged(BeaconTag::Other)
    }
}

/// Usable ranging result for one beacon in the latest batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeaconRange {
    pub beacon_id: String,
    pub rssi: i32,
    pub distance_m: f64,
    pub floor_id: i32,
}

/// Immutable engine output, replaced wholesale on every update
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineSnapshot {
    /// Increments with every published snapshot
    pub sequence: u64,
    pub position: Position,
    pub floor: FloorState,
    pub classification: BeaconClassification,
    pub scanning: bool,
    /// Ranges from the latest processed batch, closest first
    pub ranges: Vec<BeaconRange>,
}
