//! Spherical-Earth geodesy for trajectory and threat calculations.

use serde::{Deserialize, Serialize};

/// Mean Earth radius used by every great-circle calculation.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A point on the Earth's surface in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// True when both coordinates are finite and inside the valid lat/lon ranges.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }
}

/// Calculate great-circle distance between two points in meters using the Haversine formula.
pub fn distance(p1: GeoPoint, p2: GeoPoint) -> f64 {
    haversine_distance(p1.lat, p1.lon, p2.lat, p2.lon)
}

pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lon2 - lon1).to_radians();
    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Initial compass bearing from `p1` to `p2` in degrees, range (-180, 180].
pub fn bearing(p1: GeoPoint, p2: GeoPoint) -> f64 {
    let phi1 = p1.lat.to_radians();
    let phi2 = p2.lat.to_radians();
    let delta_lambda = (p2.lon - p1.lon).to_radians();

    let x = delta_lambda.sin() * phi2.cos();
    let y = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * delta_lambda.cos();

    let deg = x.atan2(y).to_degrees();
    // atan2 can land exactly on -180; fold it onto the closed end of the range.
    if deg <= -180.0 {
        deg + 360.0
    } else {
        deg
    }
}

/// Angular separation between two points in radians.
pub fn angular_separation(p1: GeoPoint, p2: GeoPoint) -> f64 {
    let phi1 = p1.lat.to_radians();
    let phi2 = p2.lat.to_radians();
    let cos_d = phi1.sin() * phi2.sin() + phi1.cos() * phi2.cos() * (p2.lon - p1.lon).to_radians().cos();
    cos_d.clamp(-1.0, 1.0).acos()
}

/// Spherical linear interpolation along the great-circle arc from `p1` to `p2`.
///
/// `progress` is the fraction of the arc travelled: 0 returns `p1`, 1 returns `p2`.
/// Identical points return `p1` unchanged.
pub fn interpolate(p1: GeoPoint, p2: GeoPoint, progress: f64) -> GeoPoint {
    let d = angular_separation(p1, p2);
    // acos rounding can leave a tiny nonzero angle for identical inputs.
    if d == 0.0 || p1 == p2 {
        return p1;
    }

    let phi1 = p1.lat.to_radians();
    let lambda1 = p1.lon.to_radians();
    let phi2 = p2.lat.to_radians();
    let lambda2 = p2.lon.to_radians();

    let sin_d = d.sin();
    let a = ((1.0 - progress) * d).sin() / sin_d;
    let b = (progress * d).sin() / sin_d;

    let x = a * phi1.cos() * lambda1.cos() + b * phi2.cos() * lambda2.cos();
    let y = a * phi1.cos() * lambda1.sin() + b * phi2.cos() * lambda2.sin();
    let z = a * phi1.sin() + b * phi2.sin();

    GeoPoint {
        lat: z.atan2((x * x + y * y).sqrt()).to_degrees(),
        lon: y.atan2(x).to_degrees(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PYONGYANG: GeoPoint = GeoPoint::new(39.0458, 125.7625);
    const SAN_FRANCISCO: GeoPoint = GeoPoint::new(37.5665, -122.4194);

    #[test]
    fn test_haversine_known_distance() {
        // ~111km between these points (1 degree latitude)
        let dist = distance(GeoPoint::new(0.0, 0.0), GeoPoint::new(1.0, 0.0));
        assert!((dist - 111_194.0).abs() < 100.0);
    }

    #[test]
    fn distance_to_self_is_zero() {
        for p in [PYONGYANG, SAN_FRANCISCO, GeoPoint::new(-89.9, 179.9), GeoPoint::new(0.0, 0.0)] {
            assert_eq!(distance(p, p), 0.0);
        }
    }

    #[test]
    fn distance_is_symmetric() {
        let there = distance(PYONGYANG, SAN_FRANCISCO);
        let back = distance(SAN_FRANCISCO, PYONGYANG);
        assert!((there - back).abs() < 1e-6);
        // Pyongyang to San Francisco is roughly 9,000 km.
        assert!(there > 8_500_000.0 && there < 9_500_000.0, "got {there}");
    }

    #[test]
    fn bearing_cardinal_directions() {
        let origin = GeoPoint::new(0.0, 0.0);
        assert!(bearing(origin, GeoPoint::new(1.0, 0.0)).abs() < 1e-9);
        assert!((bearing(origin, GeoPoint::new(0.0, 1.0)) - 90.0).abs() < 1e-9);
        assert!((bearing(origin, GeoPoint::new(0.0, -1.0)) + 90.0).abs() < 1e-9);
        assert!((bearing(origin, GeoPoint::new(-1.0, 0.0)) - 180.0).abs() < 1e-9);
    }

    #[test]
    fn interpolate_identical_points_returns_start() {
        for progress in [0.0, 0.25, 0.5, 1.0] {
            assert_eq!(interpolate(PYONGYANG, PYONGYANG, progress), PYONGYANG);
        }
    }

    #[test]
    fn interpolate_hits_endpoints() {
        let start = interpolate(PYONGYANG, SAN_FRANCISCO, 0.0);
        let end = interpolate(PYONGYANG, SAN_FRANCISCO, 1.0);
        assert!(distance(start, PYONGYANG) < 1e-3);
        assert!(distance(end, SAN_FRANCISCO) < 1e-3);
    }

    #[test]
    fn interpolate_midpoint_is_equidistant() {
        let mid = interpolate(PYONGYANG, SAN_FRANCISCO, 0.5);
        let to_start = distance(mid, PYONGYANG);
        let to_end = distance(mid, SAN_FRANCISCO);
        assert!((to_start - to_end).abs() < 1.0, "{to_start} vs {to_end}");
        assert!((to_start - distance(PYONGYANG, SAN_FRANCISCO) / 2.0).abs() < 1.0);
    }

    #[test]
    fn point_validation() {
        assert!(PYONGYANG.is_valid());
        assert!(!GeoPoint::new(123.456, 0.0).is_valid());
        assert!(!GeoPoint::new(0.0, f64::NAN).is_valid());
    }
}
