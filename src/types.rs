//! Shared constants and small geometric types.

use serde::{Deserialize, Serialize};

/// Gravitational acceleration (m/s²).
pub const GRAVITY: f64 = 9.81;

/// Fixed k3 term of the Patterson control model.
pub const PATTERSON_K3: f64 = 1.0 / 1500.0;

/// Fraction of the mean finite score used as the R-partition cutoff.
pub const DEFAULT_THRESHOLD_FACTOR: f64 = 0.5;

/// Number of brute-force candidates between progress reports.
pub const PROGRESS_INTERVAL: u64 = 10_000;

/// Point in the bike's side plane. `x` runs forward from the rear wheel
/// contact patch, `z` runs up from the ground.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub z: f64,
}

impl Point {
    pub fn new(x: f64, z: f64) -> Self {
        Self { x, z }
    }

    pub fn midpoint(&self, other: &Point) -> Point {
        Point::new((self.x + other.x) / 2.0, (self.z + other.z) / 2.0)
    }

    pub fn distance_squared(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dz = self.z - other.z;
        dx * dx + dz * dz
    }

    pub fn distance(&self, other: &Point) -> f64 {
        self.distance_squared(other).sqrt()
    }

    pub fn offset(&self, dx: f64, dz: f64) -> Point {
        Point::new(self.x + dx, self.z + dz)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.z.is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-12;

    #[test]
    fn midpoint_and_distance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);

        let mid = a.midpoint(&b);
        assert!((mid.x - 1.5).abs() < TOL);
        assert!((mid.z - 2.0).abs() < TOL);
        assert!((a.distance(&b) - 5.0).abs() < TOL);
        assert!((b.distance_squared(&a) - 25.0).abs() < TOL);
    }

    #[test]
    fn non_finite_points_are_flagged() {
        assert!(Point::new(1.0, 2.0).is_finite());
        assert!(!Point::new(f64::NAN, 2.0).is_finite());
        assert!(!Point::new(1.0, f64::INFINITY).is_finite());
    }
}
