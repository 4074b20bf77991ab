//! Mass and inertia model.
//!
//! Rider segments are idealized as simple solids. Each local inertia tensor
//! is rotated into the bike frame with `R * I * Rᵀ`, and only the roll-axis
//! component `Ixx` is kept and shifted onto the ground line with the
//! parallel-axis theorem.

use nalgebra::Matrix3;

use crate::types::Point;

/// Solid sphere about its center.
pub fn sphere_inertia(mass: f64, radius: f64) -> Matrix3<f64> {
    let i = 0.4 * mass * radius * radius;
    Matrix3::from_diagonal_element(i)
}

/// Rectangular cuboid about its center. `length` runs along the local z axis.
pub fn cuboid_inertia(mass: f64, width: f64, depth: f64, length: f64) -> Matrix3<f64> {
    let k = mass / 12.0;
    Matrix3::new(
        k * (width * width + length * length),
        0.0,
        0.0,
        0.0,
        k * (depth * depth + length * length),
        0.0,
        0.0,
        0.0,
        k * (width * width + depth * depth),
    )
}

/// Solid cylinder about its center, axis along the local z axis.
pub fn cylinder_inertia(mass: f64, radius: f64, length: f64) -> Matrix3<f64> {
    let transverse = 0.25 * mass * radius * radius + mass * length * length / 12.0;
    let axial = 0.5 * mass * radius * radius;
    Matrix3::new(
        transverse, 0.0, 0.0, //
        0.0, transverse, 0.0, //
        0.0, 0.0, axial,
    )
}

/// Local frame of the torso, leaning back at `phi` from the ground.
pub fn torso_frame(phi: f64) -> Matrix3<f64> {
    let (s, c) = phi.sin_cos();
    Matrix3::new(
        s, 0.0, c, //
        0.0, 1.0, 0.0, //
        -c, 0.0, s,
    )
}

/// Local frame of a leg, inclined at `theta` from the ground.
pub fn leg_frame(theta: f64) -> Matrix3<f64> {
    let (s, c) = theta.sin_cos();
    Matrix3::new(
        -s, 0.0, c, //
        0.0, 1.0, 0.0, //
        -c, 0.0, -s,
    )
}

/// Local frame of an arm, dropping at `zeta` below horizontal.
pub fn arm_frame(zeta: f64) -> Matrix3<f64> {
    let (s, c) = zeta.sin_cos();
    Matrix3::new(
        s, 0.0, c, //
        0.0, 1.0, 0.0, //
        c, 0.0, s,
    )
}

/// Rotate a local tensor into the global frame.
///
/// `local_frame` holds the segment's axes as rows; its transpose maps local
/// coordinates to global ones.
pub fn rotate_inertia(local: &Matrix3<f64>, local_frame: &Matrix3<f64>) -> Matrix3<f64> {
    let rotation = local_frame.transpose();
    rotation * local * rotation.transpose()
}

/// Shift a moment of inertia by `offset_squared` (perpendicular distance²).
pub fn parallel_axis(inertia: f64, mass: f64, offset_squared: f64) -> f64 {
    inertia + mass * offset_squared
}

pub fn radius_of_gyration(inertia: f64, mass: f64) -> f64 {
    (inertia / mass).sqrt()
}

/// Mass-weighted RMS of component radii of gyration.
///
/// `components` are `(mass, k)` pairs. The result is independent of order
/// and never negative.
pub fn composite_radius_of_gyration(components: &[(f64, f64)]) -> f64 {
    let total: f64 = components.iter().map(|(m, _)| m).sum();
    components
        .iter()
        .map(|(m, k)| k * k * (m / total))
        .sum::<f64>()
        .sqrt()
}

/// Weighted average position of point masses.
pub fn center_of_mass(components: &[(f64, Point)]) -> Point {
    let total: f64 = components.iter().map(|(m, _)| m).sum();
    let x = components.iter().map(|(m, p)| m * p.x).sum::<f64>() / total;
    let z = components.iter().map(|(m, p)| m * p.z).sum::<f64>() / total;
    Point::new(x, z)
}

/// Global roll inertia of one segment about the ground line.
///
/// `lateral_offset` is the segment's sideways distance from the bike's
/// center plane; `height` is its mass-center height.
pub fn segment_roll_inertia(
    local: &Matrix3<f64>,
    local_frame: &Matrix3<f64>,
    mass: f64,
    lateral_offset: f64,
    height: f64,
) -> f64 {
    let global = rotate_inertia(local, local_frame);
    parallel_axis(
        global[(0, 0)],
        mass,
        lateral_offset * lateral_offset + height * height,
    )
}
