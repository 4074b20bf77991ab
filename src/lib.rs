//! Bicycle geometry design search.
//!
//! A candidate bicycle is fifteen geometry and mass parameters. For each
//! rider the crate places the body on the bike, checks that it fits, combines
//! the masses and roll inertias, and reduces the result to the Patterson
//! coefficients. The control sensitivity curve those coefficients produce is
//! compared against a target curve; the mean squared mismatch over all riders
//! is the design's error, and infeasible designs score infinity.
//!
//! Design spaces are searched exhaustively ([`search::run_brute_force`]), by a
//! genetic algorithm ([`search::run_genetic_search`]), or by a genetic
//! algorithm that keeps separate niches alive through R-partitioning
//! ([`search::run_partitioned_genetic_search`]).
//!
//! # Example
//!
//! ```
//! use bike_geometry_search::{evaluate_design, GeometryParams, RiderParams, SegmentMassFractions};
//!
//! let params = GeometryParams {
//!     wheelbase: 1.0,
//!     hip_angle: 100.0,
//!     headtube_angle: 15.0,
//!     crank_radius: 0.1,
//!     crank_x_offset: 0.45,
//!     crank_z_offset: 0.55,
//!     fork_offset: 0.04,
//!     seat_height: 0.9,
//!     handlebar_radius: 0.3,
//!     front_wheel_radius: 0.35,
//!     rear_wheel_radius: 0.35,
//!     frame_mass: 8.0,
//!     crank_mass: 1.0,
//!     front_wheel_mass: 1.5,
//!     rear_wheel_mass: 1.5,
//! };
//! let rider = RiderParams {
//!     name: "alice".to_string(),
//!     rider_mass: 70.0,
//!     head_diameter: 0.2,
//!     torso_length: 0.6,
//!     torso_depth: 0.25,
//!     torso_width: 0.4,
//!     arm_length: 0.6,
//!     arm_diameter: 0.08,
//!     leg_length: 0.9,
//!     leg_diameter: 0.12,
//! };
//!
//! let target = [0.0, 3.0, 6.0, 8.5, 10.0];
//! let evaluation = evaluate_design(&params, &[rider], &target, target.len(), &SegmentMassFractions::default());
//! assert!(evaluation.is_feasible());
//! ```

pub mod config;
pub mod error;
pub mod fit;
pub mod geometry;
pub mod inertia;
pub mod params;
pub mod scoring;
pub mod search;
pub mod stability;
pub mod types;
pub mod wasm;

pub use error::{ConfigError, SearchError};
pub use fit::{fit_rider, DerivedBikeState, FitFailure};
pub use geometry::BikeGeometry;
pub use params::{Attribute, GeometryParams, RiderParams, SegmentMassFractions};
pub use scoring::{compute_error, evaluate_design, sum_of_squared_difference, DesignEvaluation};
pub use stability::{PattersonCoefficients, StabilityCurve};
pub use types::Point;
