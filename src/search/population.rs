//! Population management for the genetic search.

use std::collections::HashSet;

use rand::Rng;

use super::genome::{DomainSet, Genome};
use super::types::{PopulationStats, ScoredGenome};

/// Initialize a population of uniformly random genomes.
pub fn initialize_population<R: Rng + ?Sized>(
    domains: &DomainSet,
    population_size: usize,
    rng: &mut R,
) -> Vec<Genome> {
    (0..population_size).map(|_| domains.random_genome(rng)).collect()
}

/// Sort ascending by score. Equal scores keep their evaluation order and
/// infeasible designs sort last.
pub fn rank_population(mut population: Vec<ScoredGenome>) -> Vec<ScoredGenome> {
    population.sort_by(|a, b| a.score.total_cmp(&b.score));
    population
}

/// The first `n` distinct genomes of a ranked population.
pub fn distinct_best(ranked: &[ScoredGenome], n: usize) -> Vec<ScoredGenome> {
    let mut seen = HashSet::new();
    ranked
        .iter()
        .filter(|scored| seen.insert(scored.genome))
        .take(n)
        .copied()
        .collect()
}

/// Calculate population statistics.
pub fn calculate_population_stats(population: &[ScoredGenome]) -> PopulationStats {
    let mut scores: Vec<f64> = population
        .iter()
        .map(|scored| scored.score)
        .filter(|score| score.is_finite())
        .collect();

    if scores.is_empty() {
        return PopulationStats {
            best_score: f64::INFINITY,
            worst_score: f64::INFINITY,
            mean_score: f64::INFINITY,
            median_score: f64::INFINITY,
            standard_deviation: 0.0,
            feasible: 0,
        };
    }

    scores.sort_by(f64::total_cmp);

    let n = scores.len();
    let mean = scores.iter().sum::<f64>() / n as f64;
    let median = if n % 2 == 0 {
        (scores[n / 2 - 1] + scores[n / 2]) / 2.0
    } else {
        scores[n / 2]
    };
    let variance = scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n as f64;

    PopulationStats {
        best_score: scores[0],
        worst_score: scores[n - 1],
        mean_score: mean,
        median_score: median,
        standard_deviation: variance.sqrt(),
        feasible: n,
    }
}
