//! Rider fit solver.
//!
//! Places a rider on a bike by solving the seat-bottom angle that lets the
//! extended leg reach the far side of the crank circle, then builds the
//! rider's body segments, the frame tubes and the combined mass properties,
//! and finally runs the collision and sanity checks.
//!
//! A failed fit is a normal outcome, reported as [`FitFailure`].

use std::f64::consts::{FRAC_PI_2, PI};

use serde::Serialize;

use crate::geometry::{circle_line_intersection, solve_fork, BikeGeometry, Fork, FrameTubes, Line};
use crate::inertia::{
    arm_frame, center_of_mass, composite_radius_of_gyration, cuboid_inertia, cylinder_inertia,
    leg_frame, parallel_axis, radius_of_gyration, segment_roll_inertia, sphere_inertia, torso_frame,
};
use crate::params::{RiderParams, SegmentMassFractions};
use crate::stability::PattersonCoefficients;
use crate::types::Point;

/// Reason a rider could not be fit to a bike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, thiserror::Error)]
pub enum FitFailure {
    #[error("leg cannot reach the crank from the seat")]
    SeatAngleOutOfRange,
    #[error("leg cannot reach the crank once leg thickness is included")]
    AdjustedSeatAngleOutOfRange,
    #[error("fork line does not reach the front wheel")]
    ForkMissesWheel,
    #[error("a wheel intersects the rider's head")]
    HeadHitsWheel,
    #[error("front wheel intersects the rider's torso")]
    TorsoHitsFrontWheel,
    #[error("rear wheel intersects the rider's torso")]
    TorsoHitsRearWheel,
    #[error("fork is inverted")]
    ForkInverted,
    #[error("wheels overlap")]
    WheelsOverlap,
    #[error("leg length must exceed the crank diameter")]
    LegTooShort,
    #[error("crank center lies inside a wheel")]
    CrankInsideWheel,
    #[error("seat is not above the ground")]
    SeatBelowGround,
    #[error("crank reaches the ground")]
    CrankHitsGround,
    #[error("mass properties are not finite")]
    Degenerate,
}

/// Masses of the rider's body segments (kg). Arm and leg masses are per limb.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SegmentMasses {
    pub head: f64,
    pub torso: f64,
    pub arm: f64,
    pub leg: f64,
}

impl SegmentMasses {
    pub fn new(rider_mass: f64, fractions: &SegmentMassFractions) -> Self {
        Self {
            head: rider_mass * fractions.head,
            torso: rider_mass * fractions.torso,
            arm: rider_mass * fractions.arm,
            leg: rider_mass * fractions.leg,
        }
    }
}

/// Rider placement on the bike.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RiderPose {
    /// Seat-bottom angle above horizontal (rad)
    pub theta: f64,
    /// Seat-back angle measured from the rearward horizontal (rad)
    pub phi: f64,
    /// Arm drop below horizontal (rad)
    pub zeta: f64,
    /// Seat pivot (`Hx`, `Hz`)
    pub seat: Point,
    /// Hip center relative to the seat pivot
    pub hip_offset: Point,
    pub seat_back_end: Point,
    pub seat_bottom_end: Point,
    pub head: Point,
    pub torso_start: Point,
    pub torso_end: Point,
    pub torso_cg: Point,
    pub leg_end: Point,
    pub leg_cg: Point,
    pub arm_end: Point,
    pub arm_cg: Point,
}

/// Radii of gyration of each segment about the ground line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SegmentGyration {
    pub head: f64,
    pub torso: f64,
    pub arm: f64,
    pub leg: f64,
}

/// Frame tube masses, in the order of [`FrameTubes::tubes`].
pub type TubeMasses = [f64; 5];

/// Everything derived from one successful (geometry, rider) fit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedBikeState {
    pub geometry: BikeGeometry,
    pub fork: Fork,
    pub tubes: FrameTubes,
    pub tube_masses: TubeMasses,
    pub pose: RiderPose,
    pub segment_masses: SegmentMasses,
    pub segment_gyration: SegmentGyration,
    /// Frame tubes, crank and wheels
    pub frame_cg: Point,
    pub rider_cg: Point,
    /// Frame CG and rider CG weighted by frame mass and rider mass
    pub bike_cg: Point,
    pub rider_mass: f64,
    /// Bike and rider together (kg)
    pub total_mass: f64,
    pub rider_kxx: f64,
    pub bike_kxx: f64,
    pub patterson: PattersonCoefficients,
}

/// Solve the seat-bottom angle for a rider.
///
/// Returns `(theta_prime, theta)`: the angle from the leg centerline alone,
/// and the angle after lifting the leg by its own radius.
pub fn solve_seat_angle(geometry: &BikeGeometry, rider: &RiderParams) -> Result<(f64, f64), FitFailure> {
    let reach = rider.leg_length - geometry.crank_radius;
    let drop = geometry.crank_z_offset - geometry.seat_height;

    let first = drop / reach;
    if !(-1.0..=1.0).contains(&first) {
        return Err(FitFailure::SeatAngleOutOfRange);
    }
    let theta_prime = first.asin();

    let adjusted = (drop - (rider.leg_diameter / 2.0) * theta_prime.cos()) / reach;
    if !(-1.0..=1.0).contains(&adjusted) {
        return Err(FitFailure::AdjustedSeatAngleOutOfRange);
    }

    Ok((theta_prime, adjusted.asin()))
}

fn place_rider(geometry: &BikeGeometry, rider: &RiderParams, theta: f64, fork: &Fork) -> RiderPose {
    let alpha = geometry.hip_angle;
    let half_depth = rider.torso_depth / 2.0;
    let leg_radius = rider.leg_diameter / 2.0;

    let hip_direction = alpha - FRAC_PI_2 + theta;
    let hip_offset = Point::new(
        half_depth * hip_direction.cos(),
        half_depth * hip_direction.sin() + theta.cos() * leg_radius,
    );

    let seat = Point::new(
        geometry.wheelbase + geometry.crank_x_offset
            - theta.cos() * (rider.leg_length - geometry.crank_radius)
            - hip_offset.x,
        geometry.seat_height,
    );

    let phi = PI - alpha - theta;
    let (sin_phi, cos_phi) = phi.sin_cos();

    let seat_back_end = seat.offset(-rider.torso_length * cos_phi, rider.torso_length * sin_phi);
    let seat_bottom_end = seat.offset(rider.torso_depth * theta.cos(), rider.torso_depth * theta.sin());

    let shoulder_reach = rider.torso_length + rider.head_diameter / 2.0;
    let head = Point::new(
        seat.x - (shoulder_reach * cos_phi - hip_offset.x),
        seat.z + shoulder_reach * sin_phi + hip_offset.z,
    );

    let torso_start = seat.offset(hip_offset.x, hip_offset.z);
    let torso_end = torso_start.offset(-rider.torso_length * cos_phi, rider.torso_length * sin_phi);
    let torso_cg = torso_start.midpoint(&torso_end);

    // A downward-tilted seat pushes the hip below the pivot; the foot stays put.
    let leg_lift = if hip_offset.z < 0.0 { 0.0 } else { hip_offset.z };
    let leg_end = Point::new(
        seat.x + rider.leg_length * theta.cos() + hip_offset.x,
        seat.z + rider.leg_length * theta.sin() + leg_lift,
    );
    let leg_cg = torso_start.midpoint(&leg_end);

    let zeta = ((torso_end.z - fork.top.z) / (fork.top.x - torso_end.x)).atan();
    let arm_end = torso_end.offset(rider.arm_length * zeta.cos(), -rider.arm_length * zeta.sin());
    let arm_cg = torso_end.midpoint(&arm_end);

    RiderPose {
        theta,
        phi,
        zeta,
        seat,
        hip_offset,
        seat_back_end,
        seat_bottom_end,
        head,
        torso_start,
        torso_end,
        torso_cg,
        leg_end,
        leg_cg,
        arm_end,
        arm_cg,
    }
}

fn tube_masses(geometry: &BikeGeometry, tubes: &FrameTubes) -> TubeMasses {
    let total = tubes.total_length();
    tubes.tubes().map(|tube| tube.length / total * geometry.frame_mass)
}

fn frame_center_of_mass(geometry: &BikeGeometry, tubes: &FrameTubes, masses: &TubeMasses) -> Point {
    let mut components: Vec<(f64, Point)> = tubes
        .tubes()
        .iter()
        .zip(masses.iter())
        .map(|(tube, mass)| (*mass, tube.center))
        .collect();
    components.push((geometry.front_wheel_mass, geometry.front_wheel_center()));
    components.push((geometry.rear_wheel_mass, geometry.rear_wheel_center()));
    components.push((geometry.crank_mass, geometry.crank_center()));
    center_of_mass(&components)
}

fn rider_center_of_mass(pose: &RiderPose, masses: &SegmentMasses) -> Point {
    center_of_mass(&[
        (masses.head, pose.head),
        (masses.torso, pose.torso_cg),
        (2.0 * masses.leg, pose.leg_cg),
        (2.0 * masses.arm, pose.arm_cg),
    ])
}

fn segment_gyration(rider: &RiderParams, pose: &RiderPose, masses: &SegmentMasses) -> SegmentGyration {
    let head_radius = rider.head_diameter / 2.0;
    let head_ixx = parallel_axis(
        sphere_inertia(masses.head, head_radius)[(0, 0)],
        masses.head,
        pose.head.z * pose.head.z,
    );

    let torso_ixx = segment_roll_inertia(
        &cuboid_inertia(masses.torso, rider.torso_width, rider.torso_depth, rider.torso_length),
        &torso_frame(pose.phi),
        masses.torso,
        0.0,
        pose.torso_cg.z,
    );

    let leg_radius = rider.leg_diameter / 2.0;
    let leg_ixx = segment_roll_inertia(
        &cylinder_inertia(masses.leg, leg_radius, rider.leg_length),
        &leg_frame(pose.theta),
        masses.leg,
        rider.torso_width / 2.0 - leg_radius,
        pose.leg_cg.z,
    );

    let arm_radius = rider.arm_diameter / 2.0;
    let arm_ixx = segment_roll_inertia(
        &cylinder_inertia(masses.arm, arm_radius, rider.arm_length),
        &arm_frame(pose.zeta),
        masses.arm,
        rider.torso_width / 2.0 + arm_radius,
        pose.arm_cg.z,
    );

    SegmentGyration {
        head: radius_of_gyration(head_ixx, masses.head),
        torso: radius_of_gyration(torso_ixx, masses.torso),
        arm: radius_of_gyration(arm_ixx, masses.arm),
        leg: radius_of_gyration(leg_ixx, masses.leg),
    }
}

/// False when the head sphere straddles the wheel rim.
fn head_clears_wheel(head: Point, head_radius: f64, center: Point, wheel_radius: f64) -> bool {
    let d2 = head.distance_squared(&center);
    let inner = (wheel_radius - head_radius).powi(2);
    let outer = (wheel_radius + head_radius).powi(2);
    !(inner <= d2 && d2 <= outer)
}

/// Check the line through `start` with `slope` against a wheel, rejecting
/// crossings that bracket the segment `start..end` in x.
fn segment_clears_wheel(start: Point, end: Point, slope: f64, center: Point, radius: f64) -> bool {
    let line = Line::through(start, slope);
    let Some((first, second)) = circle_line_intersection(center, radius, &line) else {
        return true;
    };

    let (x1, x2) = (first.x, second.x);
    let (sx, ex) = (start.x, end.x);
    let crosses = (x1 <= sx && x2 >= ex)
        || (x1 >= sx && x2 <= ex)
        || (x2 <= sx && x1 >= ex)
        || (x2 >= sx && x1 <= ex);
    !crosses
}

fn torso_clears_wheel(geometry: &BikeGeometry, pose: &RiderPose, center: Point, radius: f64) -> bool {
    let back_slope = (geometry.hip_angle + pose.theta).tan();
    if !segment_clears_wheel(pose.seat, pose.seat_back_end, back_slope, center, radius) {
        return false;
    }

    let bottom_slope = pose.theta.tan();
    if !segment_clears_wheel(pose.seat, pose.seat_bottom_end, bottom_slope, center, radius) {
        return false;
    }

    // Rider entirely inside the wheel.
    radius < pose.seat.distance(&center)
}

/// Run the validity checks on a placed rider, in a fixed order.
pub fn check_fit(
    geometry: &BikeGeometry,
    rider: &RiderParams,
    pose: &RiderPose,
    fork: &Fork,
) -> Result<(), FitFailure> {
    let front = geometry.front_wheel_center();
    let rear = geometry.rear_wheel_center();
    let rf = geometry.front_wheel_radius;
    let rr = geometry.rear_wheel_radius;
    let head_radius = rider.head_diameter / 2.0;

    if !head_clears_wheel(pose.head, head_radius, front, rf)
        || !head_clears_wheel(pose.head, head_radius, rear, rr)
    {
        return Err(FitFailure::HeadHitsWheel);
    }
    if !torso_clears_wheel(geometry, pose, front, rf) {
        return Err(FitFailure::TorsoHitsFrontWheel);
    }
    if !torso_clears_wheel(geometry, pose, rear, rr) {
        return Err(FitFailure::TorsoHitsRearWheel);
    }
    if fork.is_inverted() {
        return Err(FitFailure::ForkInverted);
    }
    if rf + rr >= geometry.wheelbase {
        return Err(FitFailure::WheelsOverlap);
    }
    if rider.leg_length <= 2.0 * geometry.crank_radius {
        return Err(FitFailure::LegTooShort);
    }

    let crank = geometry.crank_center();
    if rf * rf >= crank.distance_squared(&front) || rr * rr >= crank.distance_squared(&rear) {
        return Err(FitFailure::CrankInsideWheel);
    }
    if geometry.seat_height <= 0.0 {
        return Err(FitFailure::SeatBelowGround);
    }
    if geometry.crank_z_offset - geometry.crank_radius <= 0.0 {
        return Err(FitFailure::CrankHitsGround);
    }
    Ok(())
}

/// Fit a rider to a bike and derive the combined mass properties.
pub fn fit_rider(
    geometry: &BikeGeometry,
    rider: &RiderParams,
    fractions: &SegmentMassFractions,
) -> Result<DerivedBikeState, FitFailure> {
    let (_, theta) = solve_seat_angle(geometry, rider)?;
    let fork = solve_fork(geometry).ok_or(FitFailure::ForkMissesWheel)?;

    let pose = place_rider(geometry, rider, theta, &fork);
    let tubes = FrameTubes::solve(geometry, pose.seat, &fork);
    let tube_masses = tube_masses(geometry, &tubes);

    let segment_masses = SegmentMasses::new(rider.rider_mass, fractions);
    let frame_cg = frame_center_of_mass(geometry, &tubes, &tube_masses);
    let rider_cg = rider_center_of_mass(&pose, &segment_masses);
    // Only the frame mass weighs the frame CG here; wheels and crank count in total_mass.
    let bike_cg = center_of_mass(&[(geometry.frame_mass, frame_cg), (rider.rider_mass, rider_cg)]);
    let total_mass = geometry.assembly_mass() + rider.rider_mass;

    let segment_gyration = segment_gyration(rider, &pose, &segment_masses);
    let rider_kxx = composite_radius_of_gyration(&[
        (segment_masses.head, segment_gyration.head),
        (segment_masses.torso, segment_gyration.torso),
        (2.0 * segment_masses.leg, segment_gyration.leg),
        (2.0 * segment_masses.arm, segment_gyration.arm),
    ]);
    let bike_kxx = composite_radius_of_gyration(&[
        (rider.rider_mass, rider_kxx),
        (geometry.frame_mass, frame_cg.z),
        (geometry.front_wheel_mass, geometry.front_wheel_radius),
        (geometry.rear_wheel_mass, geometry.rear_wheel_radius),
        (geometry.crank_mass, geometry.crank_z_offset),
    ]);

    check_fit(geometry, rider, &pose, &fork)?;

    if !bike_cg.is_finite() || !bike_kxx.is_finite() {
        return Err(FitFailure::Degenerate);
    }

    let patterson = PattersonCoefficients::compute(geometry, total_mass, bike_cg, bike_kxx);

    Ok(DerivedBikeState {
        geometry: *geometry,
        fork,
        tubes,
        tube_masses,
        pose,
        segment_masses,
        segment_gyration,
        frame_cg,
        rider_cg,
        bike_cg,
        rider_mass: rider.rider_mass,
        total_mass,
        rider_kxx,
        bike_kxx,
        patterson,
    })
}
