//! Type definitions for design-space search.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::SearchError;
use crate::params::{Attribute, GeometryParams};
use crate::types::DEFAULT_THRESHOLD_FACTOR;

use super::genome::Genome;

/// Genetic algorithm parameters for one configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GaConfig {
    /// Independent repetitions of the whole run
    pub num_runs: usize,
    /// Share of the population kept by selection (0-100)
    pub selection_percentage: f64,
    /// Share of the population produced by crossover (0-100)
    pub cross_over_percentage: f64,
    /// Share of the population produced by mutation (0-100)
    pub mutation_percentage: f64,
    /// Attributes copied from the first parent in each crossover
    pub cross_over_gene_count: usize,
    /// Attributes re-drawn in each mutation
    pub mutation_gene_count: usize,
    pub generation_count: usize,
    pub population_size: usize,
    /// Best designs kept in the result
    #[serde(default = "default_sample_count")]
    pub sample_count: usize,
}

fn default_sample_count() -> usize {
    10
}

impl Default for GaConfig {
    fn default() -> Self {
        Self {
            num_runs: 1,
            selection_percentage: 10.0,
            cross_over_percentage: 40.0,
            mutation_percentage: 40.0,
            cross_over_gene_count: 3,
            mutation_gene_count: 2,
            generation_count: 50,
            population_size: 100,
            sample_count: default_sample_count(),
        }
    }
}

impl GaConfig {
    pub fn with_population(mut self, population_size: usize, generation_count: usize) -> Self {
        self.population_size = population_size;
        self.generation_count = generation_count;
        self
    }

    pub fn with_percentages(mut self, selection: f64, cross_over: f64, mutation: f64) -> Self {
        self.selection_percentage = selection;
        self.cross_over_percentage = cross_over;
        self.mutation_percentage = mutation;
        self
    }

    pub fn with_gene_counts(mut self, cross_over: usize, mutation: usize) -> Self {
        self.cross_over_gene_count = cross_over;
        self.mutation_gene_count = mutation;
        self
    }

    pub fn with_runs(mut self, num_runs: usize) -> Self {
        self.num_runs = num_runs;
        self
    }

    pub fn with_sample_count(mut self, sample_count: usize) -> Self {
        self.sample_count = sample_count;
        self
    }

    /// Check ranges that do not depend on rounding the operator counts.
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.num_runs == 0 {
            return Err(SearchError::NoRuns);
        }
        if self.population_size == 0 {
            return Err(SearchError::EmptyPopulation);
        }
        for (name, value) in [
            ("selection_percentage", self.selection_percentage),
            ("cross_over_percentage", self.cross_over_percentage),
            ("mutation_percentage", self.mutation_percentage),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(SearchError::PercentageOutOfRange { name, value });
            }
        }
        for (operator, requested) in [
            ("crossover", self.cross_over_gene_count),
            ("mutation", self.mutation_gene_count),
        ] {
            if requested > Attribute::COUNT {
                return Err(SearchError::GeneCountTooLarge {
                    operator,
                    requested,
                    available: Attribute::COUNT,
                });
            }
        }
        Ok(())
    }
}

/// A sweep over GA parameters: every combination becomes one [`GaConfig`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GaConfigGrid {
    pub num_runs: usize,
    pub selection_percentage: Vec<f64>,
    pub cross_over_percentage: Vec<f64>,
    pub mutation_percentage: Vec<f64>,
    pub cross_over_gene_count: Vec<usize>,
    pub mutation_gene_count: Vec<usize>,
    pub generation_count: Vec<usize>,
    pub population_size: Vec<usize>,
    #[serde(default = "default_sample_count")]
    pub sample_count: usize,
}

impl GaConfigGrid {
    /// Grid holding a single configuration.
    pub fn single(config: &GaConfig) -> Self {
        Self {
            num_runs: config.num_runs,
            selection_percentage: vec![config.selection_percentage],
            cross_over_percentage: vec![config.cross_over_percentage],
            mutation_percentage: vec![config.mutation_percentage],
            cross_over_gene_count: vec![config.cross_over_gene_count],
            mutation_gene_count: vec![config.mutation_gene_count],
            generation_count: vec![config.generation_count],
            population_size: vec![config.population_size],
            sample_count: config.sample_count,
        }
    }

    /// All configurations, nested selection → crossover → mutation → gene
    /// counts → generations → population size (last varies fastest).
    pub fn expand(&self) -> Vec<GaConfig> {
        let mut configs = Vec::new();
        for &selection in &self.selection_percentage {
            for &cross_over in &self.cross_over_percentage {
                for &mutation in &self.mutation_percentage {
                    for &cross_over_genes in &self.cross_over_gene_count {
                        for &mutation_genes in &self.mutation_gene_count {
                            for &generations in &self.generation_count {
                                for &population in &self.population_size {
                                    configs.push(GaConfig {
                                        num_runs: self.num_runs,
                                        selection_percentage: selection,
                                        cross_over_percentage: cross_over,
                                        mutation_percentage: mutation,
                                        cross_over_gene_count: cross_over_genes,
                                        mutation_gene_count: mutation_genes,
                                        generation_count: generations,
                                        population_size: population,
                                        sample_count: self.sample_count,
                                    });
                                }
                            }
                        }
                    }
                }
            }
        }
        configs
    }
}

/// Whether R-partitioning clusters around low or high scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartitionMode {
    /// Keep scores at or below the threshold, best (lowest) first.
    #[default]
    Min,
    /// Keep scores at or above the threshold, highest first.
    Max,
}

/// R-partitioning parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PartitionConfig {
    /// Largest index-space distance from a seed to a member
    pub radius: f64,
    /// Attributes spanning the distance subspace
    pub attributes: Vec<Attribute>,
    #[serde(default)]
    pub mode: PartitionMode,
    /// Multiplier on the mean finite score giving the seed cutoff
    #[serde(default = "default_threshold_factor")]
    pub threshold_factor: f64,
}

fn default_threshold_factor() -> f64 {
    DEFAULT_THRESHOLD_FACTOR
}

impl PartitionConfig {
    pub fn new(radius: f64, attributes: Vec<Attribute>) -> Self {
        Self {
            radius,
            attributes,
            mode: PartitionMode::Min,
            threshold_factor: DEFAULT_THRESHOLD_FACTOR,
        }
    }

    pub fn with_mode(mut self, mode: PartitionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_threshold_factor(mut self, factor: f64) -> Self {
        self.threshold_factor = factor;
        self
    }

    pub fn validate(&self) -> Result<(), SearchError> {
        if !self.radius.is_finite() || self.radius < 0.0 {
            return Err(SearchError::InvalidRadius(self.radius));
        }
        if self.attributes.is_empty() {
            return Err(SearchError::NoPartitionAttributes);
        }
        if !self.threshold_factor.is_finite() {
            return Err(SearchError::InvalidThresholdFactor(self.threshold_factor));
        }
        Ok(())
    }
}

/// A genome with its score. `INFINITY` marks an infeasible design.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoredGenome {
    pub score: f64,
    pub genome: Genome,
}

impl ScoredGenome {
    pub fn new(score: f64, genome: Genome) -> Self {
        Self { score, genome }
    }
}

/// A concrete design with its score.
///
/// JSON has no infinity, so an infeasible score serializes as `null` and a
/// `null` score reads back as `f64::INFINITY`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoredDesign {
    #[serde(deserialize_with = "score_or_infeasible")]
    pub score: f64,
    pub params: GeometryParams,
}

fn score_or_infeasible<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::INFINITY))
}

/// Population statistics over finite scores.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PopulationStats {
    pub best_score: f64,
    pub worst_score: f64,
    pub mean_score: f64,
    pub median_score: f64,
    pub standard_deviation: f64,
    /// Number of feasible designs
    pub feasible: usize,
}

/// Progress update after each ranked generation.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationUpdate {
    /// Zero-based run index within the configuration
    pub run: usize,
    /// Generation 0 is the ranked initial population
    pub generation: usize,
    pub best_score: f64,
    pub mean_score: f64,
    pub feasible: usize,
    /// Number of genomes in the ranked generation
    pub population: usize,
}

/// Best error of every run of one configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub config: GaConfig,
    pub best_errors: Vec<f64>,
    pub min_error: f64,
    pub max_error: f64,
    pub mean_error: f64,
    /// Wall-clock time of all runs; always zero on wasm32, which has no clock
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn new(config: GaConfig, best_errors: Vec<f64>, elapsed: Duration) -> Self {
        let min_error = best_errors.iter().copied().fold(f64::INFINITY, f64::min);
        let max_error = best_errors.iter().copied().fold(0.0, f64::max);
        let mean_error = if best_errors.is_empty() {
            f64::INFINITY
        } else {
            best_errors.iter().sum::<f64>() / best_errors.len() as f64
        };
        Self {
            config,
            best_errors,
            min_error,
            max_error,
            mean_error,
            elapsed,
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = &self.config;
        writeln!(
            f,
            "  selection={}% crossover={}% mutation={}% genes={}/{} generations={} population={}",
            c.selection_percentage,
            c.cross_over_percentage,
            c.mutation_percentage,
            c.cross_over_gene_count,
            c.mutation_gene_count,
            c.generation_count,
            c.population_size,
        )?;
        writeln!(
            f,
            "    runs: {}, error min/mean/max: {:.6} / {:.6} / {:.6}, {:.2} s",
            self.best_errors.len(),
            self.min_error,
            self.mean_error,
            self.max_error,
            self.elapsed.as_secs_f64()
        )
    }
}

/// Result of the unpartitioned genetic search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GaResult {
    /// Best designs over all runs, ascending score
    pub best: Vec<ScoredDesign>,
    pub runs: Vec<RunSummary>,
}

impl GaResult {
    pub fn best_error(&self) -> f64 {
        self.best.first().map_or(f64::INFINITY, |design| design.score)
    }
}

impl fmt::Display for GaResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Genetic Search Result:")?;
        writeln!(f, "  Best error: {:.6}", self.best_error())?;
        writeln!(f, "  Designs kept: {}", self.best.len())?;
        writeln!(f, "  Configurations:")?;
        for run in &self.runs {
            write!(f, "{}", run)?;
        }
        Ok(())
    }
}

/// Result of the partitioned genetic search: one ranked list per niche.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartitionedGaResult {
    pub partitions: Vec<Vec<ScoredDesign>>,
    /// Lowest score over every partition
    pub best_error: f64,
    pub runs: Vec<RunSummary>,
}

impl fmt::Display for PartitionedGaResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Partitioned Genetic Search Result:")?;
        writeln!(f, "  Best error: {:.6}", self.best_error)?;
        writeln!(f, "  Partitions: {}", self.partitions.len())?;
        for (i, partition) in self.partitions.iter().enumerate() {
            let best = partition.first().map_or(f64::INFINITY, |design| design.score);
            writeln!(f, "    Partition {}: {} designs, best {:.6}", i + 1, partition.len(), best)?;
        }
        writeln!(f, "  Configurations:")?;
        for run in &self.runs {
            write!(f, "{}", run)?;
        }
        Ok(())
    }
}

/// Result of exhaustive enumeration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BruteForceResult {
    /// Best designs, ascending score
    pub best: Vec<ScoredDesign>,
    pub evaluated: u64,
    pub feasible: u64,
}

impl fmt::Display for BruteForceResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Brute Force Result:")?;
        writeln!(f, "  Evaluated: {}", self.evaluated)?;
        writeln!(f, "  Feasible: {}", self.feasible)?;
        for (i, design) in self.best.iter().enumerate() {
            writeln!(f, "    {}: error {:.6}", i + 1, design.score)?;
        }
        Ok(())
    }
}
