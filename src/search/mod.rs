//! Design-space search.
//!
//! Candidate bikes are genomes: one index per geometry attribute into a
//! discrete domain of legal values. Three strategies share the same scoring:
//! exhaustive enumeration, a genetic algorithm, and a genetic algorithm whose
//! selection keeps several niches alive through R-partitioning.
//!
//! # Example
//!
//! ```no_run
//! use bike_geometry_search::search::{run_optimization, DesignProblem, DomainSet, GaConfig};
//! use bike_geometry_search::config::{parse_curve, parse_domain_set, parse_riders, read_config_file};
//!
//! let domains: DomainSet = read_config_file("bike_params.txt", parse_domain_set)?;
//! let riders = read_config_file("rider_params.txt", parse_riders)?;
//! let target = read_config_file("target_curve.txt", parse_curve)?;
//!
//! let problem = DesignProblem::new(domains, riders, target);
//! let config = GaConfig::default().with_population(100, 50);
//!
//! let result = run_optimization(&problem, &config, 42)?;
//! println!("{}", result);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod algorithm;
pub mod brute_force;
pub mod crossover;
pub mod genome;
pub mod mutation;
pub mod objective;
pub mod partition;
pub mod population;
pub mod selection;
pub mod types;

// Re-export commonly used items
pub use algorithm::{
    run_ga_sweep, run_genetic_search, run_optimization, run_partitioned_ga_sweep,
    run_partitioned_genetic_search, OperatorCounts,
};
pub use brute_force::{run_brute_force, run_brute_force_with_progress, BestList};
pub use crossover::{cross_genomes, crossover};
pub use genome::{sample_attributes, DomainSet, Genome, GenomeIter};
pub use mutation::mutate;
pub use objective::{evaluate_population, DesignProblem};
pub use partition::{genome_distance, partition_threshold, r_partition};
pub use population::{calculate_population_stats, distinct_best, initialize_population, rank_population};
pub use selection::{random_fill, select_round_robin, select_top, OperatorSet};
pub use types::{
    BruteForceResult, GaConfig, GaConfigGrid, GaResult, GenerationUpdate, PartitionConfig, PartitionMode,
    PartitionedGaResult, PopulationStats, RunSummary, ScoredDesign, ScoredGenome,
};
