//! RSSI to distance conversion
//!
//! Log-distance path-loss model:
//! distance = 10 ^ ((tx_power_at_1m - rssi) / (10 * n))

use crate::core::CalibrationModel;

/// Sentinel returned when the model cannot produce a distance
pub const UNUSABLE_DISTANCE: f64 = f64::INFINITY;

/// Estimate the distance to a beacon in meters.
///
/// A zero or non-finite path-loss exponent yields [`UNUSABLE_DISTANCE`]
/// so the caller can discard the reading. No clamping is applied here.
pub fn estimate_distance(rssi: i32, model: &CalibrationModel) -> f64 {
    let n = model.path_loss_exponent;
    if n == 0.0 || !n.is_finite() || !model.tx_power_at_1m.is_finite() {
        return UNUSABLE_DISTANCE;
    }

    let exponent = (model.tx_power_at_1m - f64::from(rssi)) / (10.0 * n);
    10f64.powf(exponent)
}

/// Whether a distance can take part in weighting or floor selection
pub fn is_usable(distance_m: f64) -> bool {
    distance_m.is_finite() && distance_m >= 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(n: f64) -> CalibrationModel {
        CalibrationModel {
            tx_power_at_1m: -59.0,
            path_loss_exponent: n,
        }
    }

    #[test]
    fn test_reference_power_is_one_meter() {
        assert!((estimate_distance(-59, &model(4.0)) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_ten_db_drop() {
        // 10 dB with n = 4 is 10^(1/4)
        let d = estimate_distance(-69, &model(4.0));
        assert!((d - 10f64.powf(0.25)).abs() < 1e-9);

        // 20 dB with n = 2 is a full decade
        let d = estimate_distance(-79, &model(2.0));
        assert!((d - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_stronger_than_reference_is_closer() {
        let d = estimate_distance(-40, &model(3.5));
        assert!(d > 0.0 && d < 1.0);
    }

    #[test]
    fn test_zero_exponent_is_unusable() {
        let d = estimate_distance(-70, &model(0.0));
        assert_eq!(d, UNUSABLE_DISTANCE);
        assert!(!is_usable(d));
    }

    #[test]
    fn test_never_negative() {
        for rssi in [-120, -90, -59, -10, 0, 20] {
            assert!(estimate_distance(rssi, &model(4.0)) >= 0.0);
        }
    }
}
