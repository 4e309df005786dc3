//! Screening of catalog records and observations before use

use crate::core::{BeaconRecord, Observation};
use thiserror::Error;

/// Reasons a catalog record or an observation is dropped
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataError {
    #[error("beacon id is empty")]
    EmptyBeaconId,
    #[error("beacon {beacon_id} has non-finite coordinates ({latitude}, {longitude})")]
    NonFiniteCoordinates {
        beacon_id: String,
        latitude: f64,
        longitude: f64,
    },
    #[error("beacon {beacon_id} coordinates out of range ({latitude}, {longitude})")]
    CoordinatesOutOfRange {
        beacon_id: String,
        latitude: f64,
        longitude: f64,
    },
}

/// Screens catalog records and observations for malformed values.
///
/// Unknown beacon ids are not a data error; they are filtered later by
/// the classifier as ordinary noise.
#[derive(Debug, Clone, Copy, Default)]
pub struct DataValidator;

impl DataValidator {
    pub fn new() -> Self {
        Self
    }

    pub fn validate_record(&self, record: &BeaconRecord) -> Result<(), DataError> {
        if record.id.trim().is_empty() {
            return Err(DataError::EmptyBeaconId);
        }

        if !record.latitude.is_finite() || !record.longitude.is_finite() {
            return Err(DataError::NonFiniteCoordinates {
                beacon_id: record.id.clone(),
                latitude: record.latitude,
                longitude: record.longitude,
            });
        }

        if record.latitude.abs() > 90.0 || record.longitude.abs() > 180.0 {
            return Err(DataError::CoordinatesOutOfRange {
                beacon_id: record.id.clone(),
                latitude: record.latitude,
                longitude: record.longitude,
            });
        }

        Ok(())
    }

    /// Only a missing id makes an observation unusable. A reported
    /// distance that is negative or non-finite (scanners report -1 when
    /// they cannot range) is ignored and the RSSI is used instead.
    pub fn validate_observation(&self, observation: &Observation) -> Result<(), DataError> {
        if observation.beacon_id.trim().is_empty() {
            return Err(DataError::EmptyBeaconId);
        }

        Ok(())
    }
}
