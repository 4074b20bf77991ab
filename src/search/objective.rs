//! Genome scoring.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::error::{ConfigError, SearchError};
use crate::geometry::BikeGeometry;
use crate::params::{GeometryParams, RiderParams, SegmentMassFractions};
use crate::scoring::compute_error;

use super::genome::{DomainSet, Genome};
use super::types::{ScoredDesign, ScoredGenome};

/// Everything needed to score a genome: the design space, the riders that
/// must fit, and the target control-sensitivity curve.
#[derive(Debug, Clone)]
pub struct DesignProblem {
    pub domains: DomainSet,
    pub riders: Vec<RiderParams>,
    pub target: Vec<f64>,
    /// Number of integer speeds sampled, starting at 0
    pub top_speed: usize,
    pub fractions: SegmentMassFractions,
}

impl DesignProblem {
    /// Problem sampling as many speeds as the target curve has points.
    pub fn new(domains: DomainSet, riders: Vec<RiderParams>, target: Vec<f64>) -> Self {
        let top_speed = target.len();
        Self {
            domains,
            riders,
            target,
            top_speed,
            fractions: SegmentMassFractions::default(),
        }
    }

    pub fn with_top_speed(mut self, top_speed: usize) -> Self {
        self.top_speed = top_speed;
        self
    }

    pub fn with_fractions(mut self, fractions: SegmentMassFractions) -> Self {
        self.fractions = fractions;
        self
    }

    pub fn validate(&self) -> Result<(), SearchError> {
        if self.riders.is_empty() {
            return Err(SearchError::NoRiders);
        }
        if self.target.is_empty() {
            return Err(ConfigError::EmptyCurve.into());
        }
        for rider in &self.riders {
            rider.validate()?;
        }
        self.fractions.validate()?;
        Ok(())
    }

    pub fn score_params(&self, params: &GeometryParams) -> f64 {
        let geometry = BikeGeometry::from_params(params);
        compute_error(&geometry, &self.riders, &self.target, self.top_speed, &self.fractions)
    }

    pub fn score(&self, genome: &Genome) -> f64 {
        self.score_params(&self.domains.to_params(genome))
    }

    pub fn design(&self, scored: &ScoredGenome) -> ScoredDesign {
        ScoredDesign {
            score: scored.score,
            params: self.domains.to_params(&scored.genome),
        }
    }
}

/// Score every genome.
/// Uses parallel processing when the `parallel` feature is enabled.
#[cfg(feature = "parallel")]
pub fn evaluate_population(problem: &DesignProblem, population: Vec<Genome>) -> Vec<ScoredGenome> {
    population
        .into_par_iter()
        .map(|genome| ScoredGenome::new(problem.score(&genome), genome))
        .collect()
}

/// Score every genome (sequential, for WASM).
#[cfg(not(feature = "parallel"))]
pub fn evaluate_population(problem: &DesignProblem, population: Vec<Genome>) -> Vec<ScoredGenome> {
    population
        .into_iter()
        .map(|genome| ScoredGenome::new(problem.score(&genome), genome))
        .collect()
}
