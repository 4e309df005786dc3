//! Small-circle geometry for drawing beacon ranges

use crate::core::{Position, EARTH_RADIUS_M};

/// Default angular spacing between ring vertices (degrees)
pub const DEFAULT_RING_STEP_DEG: u32 = 10;

/// Closed polygon approximating a circle of `radius_m` around `center`.
///
/// Uses a flat-earth offset on a sphere, which is accurate at the scale
/// of indoor beacon ranges. The first vertex is repeated at the end.
pub fn range_ring(center: Position, radius_m: f64, step_deg: u32) -> Vec<Position> {
    if !(radius_m.is_finite() && radius_m > 0.0) || !center.is_finite() || step_deg == 0 {
        return Vec::new();
    }

    let cos_lat = center.lat.to_radians().cos();
    let mut ring: Vec<Position> = (0..360)
        .step_by(step_deg as usize)
        .map(|deg| {
            let angle = f64::from(deg).to_radians();
            let lat_offset = radius_m * angle.cos() / EARTH_RADIUS_M;
            let lon_offset = radius_m * angle.sin() / (EARTH_RADIUS_M * cos_lat);
            Position::new(
                center.lat + lat_offset.to_degrees(),
                center.lon + lon_offset.to_degrees(),
            )
        })
        .collect();

    if let Some(first) = ring.first().copied() {
        ring.push(first);
    }
    ring
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_is_closed() {
        let ring = range_ring(Position::new(52.22, 21.01), 5.0, DEFAULT_RING_STEP_DEG);
        assert_eq!(ring.len(), 37);
        assert_eq!(ring.first(), ring.last());
    }

    #[test]
    fn test_north_vertex_offset() {
        let center = Position::new(52.22, 21.01);
        let ring = range_ring(center, 10.0, 90);
        // 10 m north on a 6378137 m sphere
        let expected = (10.0 / EARTH_RADIUS_M).to_degrees();
        assert!((ring[0].lat - center.lat - expected).abs() < 1e-12);
        assert!((ring[0].lon - center.lon).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_inputs() {
        let center = Position::new(0.0, 0.0);
        assert!(range_ring(center, 0.0, 10).is_empty());
        assert!(range_ring(center, f64::INFINITY, 10).is_empty());
        assert!(range_ring(center, 5.0, 0).is_empty());
    }
}
