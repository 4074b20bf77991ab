//! Patterson stability curves.
//!
//! The Patterson model reduces a fitted bike to four coefficients. The
//! control spring falls off with the square of speed; control sensitivity is
//! the handlebar response the rider feels at each integer speed.

use serde::{Deserialize, Serialize};

use crate::geometry::BikeGeometry;
use crate::types::{Point, GRAVITY, PATTERSON_K3};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PattersonCoefficients {
    /// Ground trail (m)
    pub trail: f64,
    pub k1: f64,
    pub k2: f64,
    pub k3: f64,
    pub k4: f64,
}

impl PattersonCoefficients {
    /// Coefficients for a bike of `mass` with combined center of gravity `cg`
    /// and roll radius of gyration `kxx` about the ground line.
    pub fn compute(geometry: &BikeGeometry, mass: f64, cg: Point, kxx: f64) -> Self {
        let beta = geometry.headtube_angle;
        let (sin_beta, cos_beta) = beta.sin_cos();
        let a = geometry.wheelbase;
        let (x, z) = (cg.x, cg.z);
        let z2_k2 = z * z + kxx * kxx;

        let trail = geometry.front_wheel_radius * sin_beta - geometry.fork_offset / cos_beta;

        let k1 = mass * GRAVITY * (x / a) * trail * cos_beta
            * (sin_beta - z * trail * x / (a * z2_k2));
        let k2 = trail * cos_beta * cos_beta * mass * (x / (a * a)) * (kxx * kxx / z2_k2);
        let k4 = x / (z * a) * cos_beta;

        Self {
            trail,
            k1,
            k2,
            k3: PATTERSON_K3,
            k4,
        }
    }

    pub fn control_spring(&self, speed: f64) -> f64 {
        self.k1 - self.k2 * speed * speed
    }

    pub fn control_sensitivity(&self, speed: f64, handlebar_radius: f64) -> f64 {
        (self.k4 * speed)
            / (handlebar_radius
                + (self.k3 / handlebar_radius) * (-self.k1 + self.k2 * speed * speed))
    }
}

/// Control spring and sensitivity sampled at speeds `0..top_speed`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StabilityCurve {
    pub control_spring: Vec<f64>,
    pub control_sensitivity: Vec<f64>,
}

impl StabilityCurve {
    pub fn generate(coefficients: &PattersonCoefficients, handlebar_radius: f64, top_speed: usize) -> Self {
        let speeds = (0..top_speed).map(|v| v as f64);
        Self {
            control_spring: speeds.clone().map(|v| coefficients.control_spring(v)).collect(),
            control_sensitivity: speeds
                .map(|v| coefficients.control_sensitivity(v, handlebar_radius))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.control_sensitivity.len()
    }

    pub fn is_empty(&self) -> bool {
        self.control_sensitivity.is_empty()
    }
}
