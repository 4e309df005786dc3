//! Calibration defaults and engine tunables

/// Received power at one metre from a beacon (dBm)
pub const DEFAULT_TX_POWER_AT_1M: f64 = -59.0;

/// Log-distance path-loss exponent for indoor corridors
pub const DEFAULT_PATH_LOSS_EXPONENT: f64 = 4.0;

/// Distance floor applied before weighting (meters)
pub const MIN_BEACON_DISTANCE_M: f64 = 0.1;

/// Observations estimated farther than this are treated as noise (meters)
pub const MAX_RELEVANT_DISTANCE_M: f64 = 50.0;

/// Position reported before the first estimate
pub const INITIAL_LATITUDE: f64 = 52.2204685;
pub const INITIAL_LONGITUDE: f64 = 21.0101522;

/// Spherical earth radius used for range rings (meters)
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;
