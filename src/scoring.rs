//! Scoring of a geometry against a target control-sensitivity curve.

use serde::Serialize;

use crate::fit::{fit_rider, FitFailure};
use crate::geometry::BikeGeometry;
use crate::params::{GeometryParams, RiderParams, SegmentMassFractions};
use crate::stability::StabilityCurve;

/// Sum of squared differences over the common prefix of two curves.
///
/// Curves of different length are compared only up to the shorter one;
/// trailing values of the longer curve are ignored.
pub fn sum_of_squared_difference(curve: &[f64], target: &[f64]) -> f64 {
    curve
        .iter()
        .zip(target.iter())
        .map(|(a, b)| (a - b) * (a - b))
        .sum()
}

/// Mean curve-matching error of a geometry over all riders.
///
/// Returns `f64::INFINITY` as soon as one rider cannot be fit, when there
/// are no riders, or when the error is not a number.
pub fn compute_error(
    geometry: &BikeGeometry,
    riders: &[RiderParams],
    target: &[f64],
    top_speed: usize,
    fractions: &SegmentMassFractions,
) -> f64 {
    mean_error(riders.iter().map(|rider| {
        let state = fit_rider(geometry, rider, fractions).ok()?;
        let curve = StabilityCurve::generate(&state.patterson, geometry.handlebar_radius, top_speed);
        Some(sum_of_squared_difference(&curve.control_sensitivity, target))
    }))
}

/// Mean of per-rider errors, stopping at the first rider that failed to fit.
fn mean_error(errors: impl IntoIterator<Item = Option<f64>>) -> f64 {
    let mut total = 0.0;
    let mut count = 0usize;
    for error in errors {
        let Some(error) = error else {
            return f64::INFINITY;
        };
        total += error;
        count += 1;
    }
    if count == 0 {
        return f64::INFINITY;
    }

    let error = total / count as f64;
    if error.is_nan() { f64::INFINITY } else { error }
}

/// Per-rider outcome of evaluating one design.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiderEvaluation {
    pub rider_name: String,
    pub outcome: Result<RiderCurve, FitFailure>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiderCurve {
    pub curve: StabilityCurve,
    pub error: f64,
    pub trail: f64,
    pub bike_kxx: f64,
}

/// Full evaluation of a single design, every rider included.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DesignEvaluation {
    pub params: GeometryParams,
    pub riders: Vec<RiderEvaluation>,
    /// Mean error over riders, `INFINITY` if any rider failed to fit.
    pub error: f64,
}

impl DesignEvaluation {
    pub fn is_feasible(&self) -> bool {
        self.error.is_finite()
    }
}

/// Evaluate one design for every rider, keeping curves and failure reasons.
pub fn evaluate_design(
    params: &GeometryParams,
    riders: &[RiderParams],
    target: &[f64],
    top_speed: usize,
    fractions: &SegmentMassFractions,
) -> DesignEvaluation {
    let geometry = BikeGeometry::from_params(params);

    let evaluations: Vec<RiderEvaluation> = riders
        .iter()
        .map(|rider| {
            let outcome = fit_rider(&geometry, rider, fractions).map(|state| {
                let curve = StabilityCurve::generate(&state.patterson, geometry.handlebar_radius, top_speed);
                let error = sum_of_squared_difference(&curve.control_sensitivity, target);
                RiderCurve {
                    curve,
                    error,
                    trail: state.patterson.trail,
                    bike_kxx: state.bike_kxx,
                }
            });
            RiderEvaluation {
                rider_name: rider.name.clone(),
                outcome,
            }
        })
        .collect();

    let error = mean_error(
        evaluations
            .iter()
            .map(|evaluation| evaluation.outcome.as_ref().ok().map(|curve| curve.error)),
    );

    DesignEvaluation {
        params: *params,
        riders: evaluations,
        error,
    }
}
