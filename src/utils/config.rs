use crate::algorithms::{
    DistanceSource, DistanceWeighting, FloorPolicy, ProximityClassifier, SingleBeaconPolicy,
    WeightedCentroid,
};
use crate::core::{
    CalibrationModel, Position, MAX_RELEVANT_DISTANCE_M, MIN_BEACON_DISTANCE_M,
};
use crate::sources::JsonCatalogFiles;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Typical indoor range for the path-loss exponent
const TYPICAL_PATH_LOSS_RANGE: (f64, f64) = (1.5, 6.0);

/// Engine configuration, fixed at construction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// RSSI to distance calibration
    pub calibration: CalibrationModel,
    /// Distance floor used when weighting (meters)
    pub min_distance_m: f64,
    /// Observations estimated beyond this are ignored (meters)
    pub max_relevant_distance_m: f64,
    /// Position reported until the first estimate
    pub initial_position: Position,
    pub weighting: DistanceWeighting,
    pub single_beacon: SingleBeaconPolicy,
    pub floor_policy: FloorPolicy,
    pub distance_source: DistanceSource,
    /// Catalog pages, relative paths resolve against the config file
    pub catalog_files: Vec<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            calibration: CalibrationModel::default(),
            min_distance_m: MIN_BEACON_DISTANCE_M,
            max_relevant_distance_m: MAX_RELEVANT_DISTANCE_M,
            initial_position: Position::default(),
            weighting: DistanceWeighting::default(),
            single_beacon: SingleBeaconPolicy::default(),
            floor_policy: FloorPolicy::default(),
            distance_source: DistanceSource::default(),
            catalog_files: Vec::new(),
        }
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid {parameter} = {value}: {reason}")]
    InvalidParameter {
        parameter: String,
        value: String,
        reason: String,
    },
}

/// Configuration validation result
#[derive(Debug, Default)]
pub struct ValidationReport {
    /// Values the engine refuses to run with
    pub errors: Vec<ConfigError>,
    /// Values the engine tolerates, usually by discarding readings
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

fn invalid(parameter: &str, value: impl ToString, reason: &str) -> ConfigError {
    ConfigError::InvalidParameter {
        parameter: parameter.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

impl EngineConfig {
    /// Load from a JSON file. Relative catalog paths are resolved against
    /// the directory holding the config.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mut config: EngineConfig = serde_json::from_str(&content)?;
        if let Some(base) = path.parent() {
            for file in &mut config.catalog_files {
                if file.is_relative() {
                    *file = base.join(&*file);
                }
            }
        }
        Ok(config)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::default();

        if !(self.min_distance_m.is_finite() && self.min_distance_m > 0.0) {
            report.errors.push(invalid(
                "min_distance_m",
                self.min_distance_m,
                "must be a positive distance",
            ));
        }

        if !(self.max_relevant_distance_m.is_finite() && self.max_relevant_distance_m > 0.0) {
            report.errors.push(invalid(
                "max_relevant_distance_m",
                self.max_relevant_distance_m,
                "must be a positive distance",
            ));
        }

        let Position { lat, lon } = self.initial_position;
        if !self.initial_position.is_finite() || lat.abs() > 90.0 || lon.abs() > 180.0 {
            report.errors.push(invalid(
                "initial_position",
                format!("({}, {})", lat, lon),
                "must be finite degrees within ±90 / ±180",
            ));
        }

        let n = self.calibration.path_loss_exponent;
        if n == 0.0 || !n.is_finite() {
            report.warnings.push(format!(
                "path_loss_exponent = {}: every observation will be discarded",
                n
            ));
        } else if n < TYPICAL_PATH_LOSS_RANGE.0 || n > TYPICAL_PATH_LOSS_RANGE.1 {
            report.warnings.push(format!(
                "path_loss_exponent = {} is outside the typical {}-{} range",
                n, TYPICAL_PATH_LOSS_RANGE.0, TYPICAL_PATH_LOSS_RANGE.1
            ));
        }

        if !self.calibration.tx_power_at_1m.is_finite() {
            report.warnings.push(format!(
                "tx_power_at_1m = {}: every observation will be discarded",
                self.calibration.tx_power_at_1m
            ));
        }

        report
    }

    /// Validate and return the config, or the first error
    pub fn checked(self) -> Result<Self, ConfigError> {
        match self.validate().errors.into_iter().next() {
            Some(error) => Err(error),
            None => Ok(self),
        }
    }

    pub fn position_estimator(&self) -> WeightedCentroid {
        WeightedCentroid::new(self.min_distance_m)
            .with_weighting(self.weighting)
            .with_single_beacon_policy(self.single_beacon)
    }

    pub fn classifier(&self) -> ProximityClassifier {
        ProximityClassifier::new(self.calibration, self.max_relevant_distance_m)
            .with_floor_policy(self.floor_policy)
            .with_distance_source(self.distance_source)
    }

    pub fn catalog_loader(&self) -> JsonCatalogFiles {
        JsonCatalogFiles::new(self.catalog_files.iter().cloned())
    }
}
