//! WASM bindings for browser integration.
//!
//! JSON in, JSON out. Geometry and rider records use the same key names as
//! the text configuration files.
//!
//! JSON cannot hold infinity: every infeasible score or error in the output
//! (a design score, a mean error, a run's best error) is written as `null`.
//! Read `null` as "no rider could be fit".

#![cfg(target_arch = "wasm32")]

use wasm_bindgen::prelude::*;

use crate::params::{GeometryParams, RiderParams, SegmentMassFractions};
use crate::scoring::evaluate_design;
use crate::search::{run_brute_force, run_optimization, DesignProblem, DomainSet, GaConfig};

/// Initialize panic hook for better error messages in browser console.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

fn parse_inputs(riders_json: &str, target_json: &str) -> Result<(Vec<RiderParams>, Vec<f64>), JsValue> {
    let riders: Vec<RiderParams> = serde_json::from_str(riders_json)
        .map_err(|e| JsValue::from_str(&format!("Invalid riders JSON: {}", e)))?;
    let target: Vec<f64> = serde_json::from_str(target_json)
        .map_err(|e| JsValue::from_str(&format!("Invalid target JSON: {}", e)))?;
    Ok((riders, target))
}

fn parse_domains(domains_json: &str) -> Result<DomainSet, JsValue> {
    serde_json::from_str(domains_json).map_err(|e| JsValue::from_str(&format!("Invalid domains JSON: {}", e)))
}

/// Evaluate one design for every rider.
///
/// # Arguments
/// * `params_json` - JSON object with the fifteen geometry parameters
/// * `riders_json` - JSON array of riders: `[{"rider_name": "a", "rider_mass": 70, ...}]`
/// * `target_json` - JSON array of target control sensitivities, one per speed
///
/// # Returns
/// JSON object with per-rider curves or fit failures and the mean error,
/// which is `null` when any rider fails to fit
#[wasm_bindgen]
pub fn evaluate_design_json(params_json: &str, riders_json: &str, target_json: &str) -> Result<String, JsValue> {
    let params: GeometryParams = serde_json::from_str(params_json)
        .map_err(|e| JsValue::from_str(&format!("Invalid geometry JSON: {}", e)))?;
    let (riders, target) = parse_inputs(riders_json, target_json)?;

    let evaluation = evaluate_design(&params, &riders, &target, target.len(), &SegmentMassFractions::default());

    serde_json::to_string(&evaluation).map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

/// Mean error of one design, or `null` when it is infeasible.
#[wasm_bindgen]
pub fn compute_error_json(params_json: &str, riders_json: &str, target_json: &str) -> Result<String, JsValue> {
    let params: GeometryParams = serde_json::from_str(params_json)
        .map_err(|e| JsValue::from_str(&format!("Invalid geometry JSON: {}", e)))?;
    let (riders, target) = parse_inputs(riders_json, target_json)?;

    let problem = DesignProblem::new(DomainSet::single(&params), riders, target);
    let error = problem.score_params(&params);

    serde_json::to_string(&error).map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

/// Exhaustive search over a small design space.
///
/// # Arguments
/// * `domains_json` - JSON object mapping each attribute name to its legal values
/// * `riders_json` - JSON array of riders
/// * `target_json` - JSON array of target control sensitivities
/// * `sample_count` - Number of best designs to return
///
/// # Returns
/// JSON object whose `best` designs carry a `score`, `null` when infeasible
#[wasm_bindgen]
pub fn brute_force_json(
    domains_json: &str,
    riders_json: &str,
    target_json: &str,
    sample_count: usize,
) -> Result<String, JsValue> {
    let domains = parse_domains(domains_json)?;
    let (riders, target) = parse_inputs(riders_json, target_json)?;

    let problem = DesignProblem::new(domains, riders, target);
    let result = run_brute_force(&problem, sample_count).map_err(|e| JsValue::from_str(&e.to_string()))?;

    serde_json::to_string(&result).map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

/// Seeded genetic search.
///
/// # Arguments
/// * `config_json` - JSON object of GA parameters (see [`GaConfig`])
/// * `seed` - Random seed; equal seeds give equal results
///
/// # Returns
/// JSON object with the best designs and per-configuration run summaries;
/// infeasible scores are `null` and `elapsed` is always zero in the browser
#[wasm_bindgen]
pub fn genetic_search_json(
    domains_json: &str,
    riders_json: &str,
    target_json: &str,
    config_json: &str,
    seed: u64,
) -> Result<String, JsValue> {
    let domains = parse_domains(domains_json)?;
    let (riders, target) = parse_inputs(riders_json, target_json)?;
    let config: GaConfig = serde_json::from_str(config_json)
        .map_err(|e| JsValue::from_str(&format!("Invalid GA config JSON: {}", e)))?;

    let problem = DesignProblem::new(domains, riders, target);
    let result = run_optimization(&problem, &config, seed).map_err(|e| JsValue::from_str(&e.to_string()))?;

    serde_json::to_string(&result).map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}
