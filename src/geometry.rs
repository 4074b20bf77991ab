//! Frame geometry solver.
//!
//! Closed-form placement of the fork and frame tubes in the bike's side
//! plane. The rear wheel center sits at `(0, Rr)`, the front wheel center at
//! `(A, Rf)` and the crank center at `(A + Cx, Cz)`.

use std::f64::consts::PI;

use serde::Serialize;

use crate::params::GeometryParams;
use crate::types::Point;

/// Geometry parameters with angles converted to radians.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BikeGeometry {
    pub wheelbase: f64,
    pub hip_angle: f64,
    pub headtube_angle: f64,
    pub crank_radius: f64,
    pub crank_x_offset: f64,
    pub crank_z_offset: f64,
    pub fork_offset: f64,
    pub seat_height: f64,
    pub handlebar_radius: f64,
    pub front_wheel_radius: f64,
    pub rear_wheel_radius: f64,
    pub frame_mass: f64,
    pub crank_mass: f64,
    pub front_wheel_mass: f64,
    pub rear_wheel_mass: f64,
}

impl BikeGeometry {
    pub fn from_params(params: &GeometryParams) -> Self {
        Self {
            wheelbase: params.wheelbase,
            hip_angle: params.hip_angle.to_radians(),
            headtube_angle: params.headtube_angle.to_radians(),
            crank_radius: params.crank_radius,
            crank_x_offset: params.crank_x_offset,
            crank_z_offset: params.crank_z_offset,
            fork_offset: params.fork_offset,
            seat_height: params.seat_height,
            handlebar_radius: params.handlebar_radius,
            front_wheel_radius: params.front_wheel_radius,
            rear_wheel_radius: params.rear_wheel_radius,
            frame_mass: params.frame_mass,
            crank_mass: params.crank_mass,
            front_wheel_mass: params.front_wheel_mass,
            rear_wheel_mass: params.rear_wheel_mass,
        }
    }

    pub fn rear_wheel_center(&self) -> Point {
        Point::new(0.0, self.rear_wheel_radius)
    }

    pub fn front_wheel_center(&self) -> Point {
        Point::new(self.wheelbase, self.front_wheel_radius)
    }

    pub fn crank_center(&self) -> Point {
        Point::new(self.wheelbase + self.crank_x_offset, self.crank_z_offset)
    }

    /// Frame tubes plus crank and both wheels.
    pub fn assembly_mass(&self) -> f64 {
        self.frame_mass + self.crank_mass + self.front_wheel_mass + self.rear_wheel_mass
    }
}

/// Non-vertical line `z = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line {
    pub slope: f64,
    pub intercept: f64,
}

impl Line {
    pub fn through(point: Point, slope: f64) -> Self {
        Self {
            slope,
            intercept: point.z - slope * point.x,
        }
    }

    pub fn z_at(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }

    pub fn x_at(&self, z: f64) -> f64 {
        (z - self.intercept) / self.slope
    }
}

/// Intersect a line with a circle.
///
/// Returns the `+sqrt` root first. `None` when the discriminant is negative
/// (or not a number), meaning the line misses the circle.
pub fn circle_line_intersection(center: Point, radius: f64, line: &Line) -> Option<(Point, Point)> {
    let s = line.slope;
    let dz = line.intercept - center.z;

    let a = s * s + 1.0;
    let b = 2.0 * dz * s - 2.0 * center.x;
    let c = center.x * center.x + dz * dz - radius * radius;

    let discriminant = b * b - 4.0 * a * c;
    if !(discriminant >= 0.0) {
        return None;
    }

    let root = discriminant.sqrt();
    let x1 = (-b + root) / (2.0 * a);
    let x2 = (-b - root) / (2.0 * a);
    Some((
        Point::new(x1, line.z_at(x1)),
        Point::new(x2, line.z_at(x2)),
    ))
}

/// Fork centerline from the front axle drop-out to the head of the fork.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Fork {
    pub bottom: Point,
    pub top: Point,
}

impl Fork {
    pub fn is_inverted(&self) -> bool {
        self.top.z < self.bottom.z
    }
}

/// Solve the fork line against the front wheel.
///
/// The steering axis leans back by the headtube angle and passes through the
/// fork bottom, which sits `fork_offset` behind the axle along the axis
/// normal. When the seat is higher than the front wheel's diameter the fork
/// top is raised to seat height; otherwise the higher wheel crossing is used.
pub fn solve_fork(geometry: &BikeGeometry) -> Option<Fork> {
    let beta = geometry.headtube_angle;
    let rf = geometry.front_wheel_radius;
    let e = geometry.fork_offset;

    let slope = (PI / 2.0 + beta).tan();
    let bottom = Point::new(
        geometry.wheelbase + e * (PI + beta).cos(),
        rf + e * (PI + beta).sin(),
    );
    let axis = Line::through(bottom, slope);

    let (first, second) = circle_line_intersection(geometry.front_wheel_center(), rf, &axis)?;

    let top = if geometry.seat_height > 2.0 * rf {
        Point::new(axis.x_at(geometry.seat_height), geometry.seat_height)
    } else if first.z > second.z {
        first
    } else {
        second
    };

    Some(Fork { bottom, top })
}

/// Straight frame member reduced to its mass center and length.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Tube {
    pub center: Point,
    pub length: f64,
}

impl Tube {
    /// Single tube between two points.
    pub fn between(start: Point, end: Point) -> Self {
        Self {
            center: start.midpoint(&end),
            length: start.distance(&end),
        }
    }

    /// Left/right pair of tubes between two points.
    pub fn paired(start: Point, end: Point) -> Self {
        Self {
            center: start.midpoint(&end),
            length: 2.0 * start.distance(&end),
        }
    }

    /// Tube whose apportioned length is half the span between two points.
    pub fn half_span(start: Point, end: Point) -> Self {
        Self {
            center: start.midpoint(&end),
            length: 0.5 * start.distance(&end),
        }
    }
}

/// The five frame members used for mass apportioning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FrameTubes {
    pub seat_stays: Tube,
    pub chain_stays: Tube,
    pub fork: Tube,
    pub top_tube: Tube,
    pub down_tube: Tube,
}

impl FrameTubes {
    /// Place the tubes once the seat pivot position is known.
    pub fn solve(geometry: &BikeGeometry, seat: Point, fork: &Fork) -> Self {
        let rear_axle = geometry.rear_wheel_center();
        let crank = geometry.crank_center();

        Self {
            seat_stays: Tube::paired(rear_axle, seat),
            chain_stays: Tube::paired(rear_axle, crank),
            fork: Tube::paired(fork.bottom, fork.top),
            top_tube: Tube::between(fork.top, seat),
            down_tube: Tube::half_span(fork.top, crank),
        }
    }

    pub fn tubes(&self) -> [Tube; 5] {
        [
            self.seat_stays,
            self.chain_stays,
            self.fork,
            self.top_tube,
            self.down_tube,
        ]
    }

    pub fn total_length(&self) -> f64 {
        self.tubes().iter().map(|t| t.length).sum()
    }
}
