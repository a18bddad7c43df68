//! Great-circle distance between stop coordinates.

use serde::{Deserialize, Serialize};

const EARTH_RADIUS_METERS: f64 = 6_371_000.0;
const EPSILON: f64 = 1e-6;

/// A point on the globe, latitude/longitude in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Coordinates { lat, lng }
    }

    /// Coordinate equality within `EPSILON` on each axis, avoiding spurious
    /// non-zero distances from float jitter.
    fn nearly_eq(&self, other: &Coordinates) -> bool {
        (self.lat - other.lat).abs() < EPSILON && (self.lng - other.lng).abs() < EPSILON
    }
}

/// Spherical law of cosines distance in meters, zero when the two points are
/// the same within epsilon (keeps `acos` away from its precision cliff at 1.0).
pub fn compute_distance(from: Coordinates, to: Coordinates) -> f64 {
    if from.nearly_eq(&to) {
        return 0.0;
    }
    let dr = std::f64::consts::PI / 180.0;
    let central_angle = (from.lat * dr).sin() * (to.lat * dr).sin()
        + (from.lat * dr).cos() * (to.lat * dr).cos() * ((from.lng - to.lng).abs() * dr).cos();
    central_angle.acos() * EARTH_RADIUS_METERS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_point_is_zero_distance() {
        let a = Coordinates::new(55.611_087, 37.20829);
        assert_eq!(compute_distance(a, a), 0.0);
    }

    #[test]
    fn near_duplicate_within_epsilon_is_zero() {
        let a = Coordinates::new(55.611_087, 37.20829);
        let b = Coordinates::new(55.611_087 + 1e-9, 37.20829 - 1e-9);
        assert_eq!(compute_distance(a, b), 0.0);
    }

    #[test]
    fn known_pair_is_positive_and_symmetric() {
        let a = Coordinates::new(55.611_087, 37.20829);
        let b = Coordinates::new(55.595_884, 37.209755);
        let d1 = compute_distance(a, b);
        let d2 = compute_distance(b, a);
        assert!(d1 > 0.0);
        assert!((d1 - d2).abs() < 1e-6);
    }
}
