//! Genetic search over the design space.
//!
//! One generation keeps the selected genomes, tops the parent pool up with a
//! random fill, then adds crossover children and mutants drawn from that
//! pool. Every configuration runs `num_runs` times from one random stream;
//! the best designs of all runs are merged.

use std::time::Duration;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Instant;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::SearchError;

use super::crossover::crossover;
use super::genome::sample_attributes;
use super::mutation::mutate;
use super::objective::{evaluate_population, DesignProblem};
use super::partition::r_partition;
use super::population::{calculate_population_stats, distinct_best, initialize_population, rank_population};
use super::selection::{random_fill, OperatorSet};
use super::types::{
    GaConfig, GaConfigGrid, GaResult, GenerationUpdate, PartitionConfig, PartitionedGaResult, RunSummary,
    ScoredDesign, ScoredGenome,
};

/// Number of genomes each operator contributes per generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperatorCounts {
    pub selection: usize,
    pub crossover: usize,
    pub mutation: usize,
    pub random_fill: usize,
}

impl OperatorCounts {
    /// Round each percentage of the population to a count.
    ///
    /// Fails when the counts exceed the population, or when crossover or
    /// mutation are requested without any parents to draw from.
    pub fn from_config(config: &GaConfig) -> Result<Self, SearchError> {
        config.validate()?;

        let population_size = config.population_size;
        let count = |percentage: f64| (population_size as f64 * percentage / 100.0).round() as usize;

        let selection = count(config.selection_percentage);
        let crossover = count(config.cross_over_percentage);
        let mutation = count(config.mutation_percentage);

        let used = selection + crossover + mutation;
        if used > population_size {
            return Err(SearchError::OperatorCountsExceedPopulation {
                selection,
                crossover,
                mutation,
                population_size,
            });
        }

        let random_fill = population_size - used;
        if selection + random_fill == 0 && crossover + mutation > 0 {
            return Err(SearchError::EmptyParentPool);
        }

        Ok(Self {
            selection,
            crossover,
            mutation,
            random_fill,
        })
    }

    pub fn total(&self) -> usize {
        self.selection + self.crossover + self.mutation + self.random_fill
    }
}

/// Wall-clock timer for a configuration's runs.
///
/// `std::time::Instant` panics on wasm32-unknown-unknown, so there every
/// measurement is zero.
struct Stopwatch {
    #[cfg(not(target_arch = "wasm32"))]
    start: Instant,
}

impl Stopwatch {
    #[cfg(not(target_arch = "wasm32"))]
    fn start() -> Self {
        Self { start: Instant::now() }
    }

    #[cfg(target_arch = "wasm32")]
    fn start() -> Self {
        Self {}
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    #[cfg(target_arch = "wasm32")]
    fn elapsed(&self) -> Duration {
        Duration::ZERO
    }
}

fn stop_requested<S: Fn() -> bool>(should_stop: &Option<S>) -> bool {
    should_stop.as_ref().is_some_and(|stop| stop())
}

fn report<F: FnMut(GenerationUpdate)>(
    on_progress: &mut Option<F>,
    ranked: &[ScoredGenome],
    run: usize,
    generation: usize,
) {
    let stats = calculate_population_stats(ranked);
    log::debug!(
        "run {} generation {}: best {:.6}, mean {:.6}, {} of {} feasible",
        run,
        generation,
        stats.best_score,
        stats.mean_score,
        stats.feasible,
        ranked.len()
    );
    if let Some(progress) = on_progress.as_mut() {
        progress(GenerationUpdate {
            run,
            generation,
            best_score: stats.best_score,
            mean_score: stats.mean_score,
            feasible: stats.feasible,
            population: ranked.len(),
        });
    }
}

/// One full run; returns the ranked final population.
fn run_single<R, F, S>(
    problem: &DesignProblem,
    config: &GaConfig,
    counts: &OperatorCounts,
    operators: &OperatorSet,
    rng: &mut R,
    run: usize,
    on_progress: &mut Option<F>,
    should_stop: &Option<S>,
) -> Vec<ScoredGenome>
where
    R: Rng + ?Sized,
    F: FnMut(GenerationUpdate),
    S: Fn() -> bool,
{
    let domains = &problem.domains;

    let population = initialize_population(domains, config.population_size, rng);
    let mut ranked = rank_population(evaluate_population(problem, population));
    report(on_progress, &ranked, run, 0);

    for generation in 1..=config.generation_count {
        if stop_requested(should_stop) {
            log::info!("run {} stopped before generation {}", run, generation);
            break;
        }

        let mut pool = ranked;
        let mut parents = operators.select(&mut pool, counts.selection);

        let shortfall = counts.selection - parents.len();
        if shortfall > 0 {
            log::warn!(
                "generation {}: selection returned {} of {}, filling {} at random",
                generation,
                parents.len(),
                counts.selection,
                shortfall
            );
        }
        parents.extend(random_fill(&mut pool, counts.random_fill + shortfall, domains, rng));

        let cross_over_attributes = sample_attributes(rng, config.cross_over_gene_count);
        let children = crossover(&parents, &cross_over_attributes, counts.crossover, rng);

        let mutation_attributes = sample_attributes(rng, config.mutation_gene_count);
        let mutants = mutate(&parents, domains, &mutation_attributes, counts.mutation, rng);

        let mut next = parents;
        next.extend(children);
        next.extend(mutants);

        ranked = rank_population(evaluate_population(problem, next));
        report(on_progress, &ranked, run, generation);
    }

    ranked
}

/// Run every configuration `num_runs` times. Returns the pooled final
/// populations and one summary per configuration.
fn run_configs<R, F, S>(
    problem: &DesignProblem,
    configs: &[GaConfig],
    operators: &OperatorSet,
    rng: &mut R,
    mut on_progress: Option<F>,
    should_stop: Option<S>,
) -> Result<(Vec<ScoredGenome>, Vec<RunSummary>), SearchError>
where
    R: Rng + ?Sized,
    F: FnMut(GenerationUpdate),
    S: Fn() -> bool,
{
    problem.validate()?;
    if let OperatorSet::Partitioned(partition) = operators {
        partition.validate()?;
    }
    let counts = configs
        .iter()
        .map(OperatorCounts::from_config)
        .collect::<Result<Vec<_>, _>>()?;

    let mut pooled = Vec::new();
    let mut summaries = Vec::with_capacity(configs.len());

    'configs: for (config, counts) in configs.iter().zip(counts.iter()) {
        log::info!(
            "GA config: selection {}%, crossover {}%, mutation {}%, genes {}/{}, {} generations, population {}",
            config.selection_percentage,
            config.cross_over_percentage,
            config.mutation_percentage,
            config.cross_over_gene_count,
            config.mutation_gene_count,
            config.generation_count,
            config.population_size
        );

        let stopwatch = Stopwatch::start();
        let mut best_errors = Vec::with_capacity(config.num_runs);

        for run in 0..config.num_runs {
            if stop_requested(&should_stop) {
                if !best_errors.is_empty() {
                    summaries.push(RunSummary::new(config.clone(), best_errors, stopwatch.elapsed()));
                }
                break 'configs;
            }

            let ranked = run_single(problem, config, counts, operators, rng, run, &mut on_progress, &should_stop);
            best_errors.push(ranked.first().map_or(f64::INFINITY, |best| best.score));
            pooled.extend(ranked);
        }

        let summary = RunSummary::new(config.clone(), best_errors, stopwatch.elapsed());
        log::info!(
            "GA config done: error min {:.6}, mean {:.6}, max {:.6}",
            summary.min_error,
            summary.mean_error,
            summary.max_error
        );
        summaries.push(summary);
    }

    Ok((rank_population(pooled), summaries))
}

fn sample_count(configs: &[GaConfig]) -> usize {
    configs.first().map_or(0, |config| config.sample_count)
}

fn ga_result(problem: &DesignProblem, pooled: &[ScoredGenome], runs: Vec<RunSummary>, sample_count: usize) -> GaResult {
    let best = distinct_best(pooled, sample_count)
        .iter()
        .map(|scored| problem.design(scored))
        .collect();
    GaResult { best, runs }
}

fn partitioned_result(
    problem: &DesignProblem,
    pooled: &[ScoredGenome],
    partition: &PartitionConfig,
    runs: Vec<RunSummary>,
    sample_count: usize,
) -> PartitionedGaResult {
    let distinct = distinct_best(pooled, pooled.len());
    let partitions: Vec<Vec<ScoredDesign>> = r_partition(&distinct, partition)
        .into_iter()
        .map(|members| {
            members
                .into_iter()
                .take(sample_count)
                .map(|index| problem.design(&distinct[index]))
                .collect()
        })
        .collect();

    let best_error = partitions
        .iter()
        .filter_map(|designs| designs.first())
        .map(|design| design.score)
        .fold(f64::INFINITY, f64::min);

    PartitionedGaResult {
        partitions,
        best_error,
        runs,
    }
}

/// Run the unpartitioned genetic search.
///
/// # Arguments
/// * `problem` - Design space, riders and target curve
/// * `config` - GA parameters
/// * `rng` - Random source; a seeded generator makes the run reproducible
/// * `on_progress` - Optional callback after each ranked generation
/// * `should_stop` - Optional callback to check if the search should stop
pub fn run_genetic_search<R, F, S>(
    problem: &DesignProblem,
    config: &GaConfig,
    rng: &mut R,
    on_progress: Option<F>,
    should_stop: Option<S>,
) -> Result<GaResult, SearchError>
where
    R: Rng + ?Sized,
    F: FnMut(GenerationUpdate),
    S: Fn() -> bool,
{
    let configs = [config.clone()];
    let (pooled, runs) = run_configs(problem, &configs, &OperatorSet::Unpartitioned, rng, on_progress, should_stop)?;
    Ok(ga_result(problem, &pooled, runs, config.sample_count))
}

/// Run the partitioned genetic search: selection round-robins across the
/// niches of the ranked pool, and the merged final populations are returned
/// as one ranked list per niche.
pub fn run_partitioned_genetic_search<R, F, S>(
    problem: &DesignProblem,
    config: &GaConfig,
    partition: &PartitionConfig,
    rng: &mut R,
    on_progress: Option<F>,
    should_stop: Option<S>,
) -> Result<PartitionedGaResult, SearchError>
where
    R: Rng + ?Sized,
    F: FnMut(GenerationUpdate),
    S: Fn() -> bool,
{
    let configs = [config.clone()];
    let operators = OperatorSet::Partitioned(partition.clone());
    let (pooled, runs) = run_configs(problem, &configs, &operators, rng, on_progress, should_stop)?;
    Ok(partitioned_result(problem, &pooled, partition, runs, config.sample_count))
}

/// Run every configuration of a parameter sweep with the unpartitioned
/// search and merge the best designs.
pub fn run_ga_sweep<R, F>(
    problem: &DesignProblem,
    grid: &GaConfigGrid,
    rng: &mut R,
    on_progress: Option<F>,
) -> Result<GaResult, SearchError>
where
    R: Rng + ?Sized,
    F: FnMut(GenerationUpdate),
{
    let configs = grid.expand();
    let (pooled, runs) =
        run_configs(problem, &configs, &OperatorSet::Unpartitioned, rng, on_progress, None::<fn() -> bool>)?;
    Ok(ga_result(problem, &pooled, runs, sample_count(&configs)))
}

/// Partitioned counterpart of [`run_ga_sweep`].
pub fn run_partitioned_ga_sweep<R, F>(
    problem: &DesignProblem,
    grid: &GaConfigGrid,
    partition: &PartitionConfig,
    rng: &mut R,
    on_progress: Option<F>,
) -> Result<PartitionedGaResult, SearchError>
where
    R: Rng + ?Sized,
    F: FnMut(GenerationUpdate),
{
    let configs = grid.expand();
    let operators = OperatorSet::Partitioned(partition.clone());
    let (pooled, runs) = run_configs(problem, &configs, &operators, rng, on_progress, None::<fn() -> bool>)?;
    Ok(partitioned_result(problem, &pooled, partition, runs, sample_count(&configs)))
}

/// Run the unpartitioned search from a seed, without callbacks (simpler API).
pub fn run_optimization(problem: &DesignProblem, config: &GaConfig, seed: u64) -> Result<GaResult, SearchError> {
    let mut rng = StdRng::seed_from_u64(seed);
    run_genetic_search(problem, config, &mut rng, None::<fn(GenerationUpdate)>, None::<fn() -> bool>)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::Attribute;
    use crate::search::genome::Genome;
    use crate::search::objective::tests::small_problem;

    fn test_config() -> GaConfig {
        GaConfig::default()
            .with_population(12, 4)
            .with_percentages(25.0, 25.0, 25.0)
            .with_gene_counts(2, 1)
            .with_sample_count(3)
    }

    #[test]
    fn stopwatch_measures_forward() {
        let stopwatch = Stopwatch::start();
        let first = stopwatch.elapsed();
        assert!(stopwatch.elapsed() >= first);
    }

    #[test]
    fn run_summary_records_elapsed_time() {
        let result = run_optimization(&small_problem(), &test_config(), 4).unwrap();
        assert_eq!(result.runs.len(), 1);
        assert!(result.runs[0].elapsed < Duration::from_secs(3600));
    }

    #[test]
    fn counts_round_and_fill_population() {
        let config = GaConfig::default().with_population(7, 1).with_percentages(10.0, 30.0, 30.0);
        let counts = OperatorCounts::from_config(&config).unwrap();
        assert_eq!(counts.selection, 1);
        assert_eq!(counts.crossover, 2);
        assert_eq!(counts.mutation, 2);
        assert_eq!(counts.random_fill, 2);
        assert_eq!(counts.total(), 7);
    }

    #[test]
    fn counts_above_population_are_fatal() {
        let config = GaConfig::default().with_population(10, 1).with_percentages(50.0, 40.0, 20.0);
        assert!(matches!(
            OperatorCounts::from_config(&config),
            Err(SearchError::OperatorCountsExceedPopulation { .. })
        ));
    }

    #[test]
    fn offspring_without_parents_is_fatal() {
        let config = GaConfig::default().with_population(10, 1).with_percentages(0.0, 50.0, 50.0);
        assert!(matches!(OperatorCounts::from_config(&config), Err(SearchError::EmptyParentPool)));
    }

    #[test]
    fn misconfigured_search_aborts_before_scoring() {
        let config = test_config().with_percentages(60.0, 60.0, 0.0);
        let mut generations = 0;
        let result = run_genetic_search(
            &small_problem(),
            &config,
            &mut StdRng::seed_from_u64(1),
            Some(|_: GenerationUpdate| generations += 1),
            None::<fn() -> bool>,
        );
        assert!(result.is_err());
        assert_eq!(generations, 0);
    }

    #[test]
    fn search_returns_sorted_distinct_designs() {
        let result = run_optimization(&small_problem(), &test_config(), 42).unwrap();
        assert!(!result.best.is_empty() && result.best.len() <= 3);
        for pair in result.best.windows(2) {
            assert!(pair[0].score <= pair[1].score);
            assert_ne!(pair[0].params, pair[1].params);
        }
        assert_eq!(result.runs.len(), 1);
        assert_eq!(result.runs[0].best_errors.len(), 1);
        assert_eq!(result.best_error(), result.runs[0].min_error);
    }

    #[test]
    fn small_space_search_finds_brute_force_optimum() {
        let problem = small_problem();
        let exhaustive = crate::search::brute_force::run_brute_force(&problem, 1).unwrap();
        // Mutating every gene re-draws whole designs, so the space is covered.
        let config = test_config().with_population(30, 20).with_gene_counts(2, 15);
        let result = run_optimization(&problem, &config, 3).unwrap();
        assert_eq!(result.best[0].params, exhaustive.best[0].params);
    }

    #[test]
    fn seeded_runs_are_reproducible() {
        let problem = small_problem();
        let a = run_optimization(&problem, &test_config(), 7).unwrap();
        let b = run_optimization(&problem, &test_config(), 7).unwrap();
        assert_eq!(a.best, b.best);
    }

    #[test]
    fn progress_reports_every_generation_of_every_run() {
        let config = test_config().with_runs(2);
        let mut updates = Vec::new();
        let result = run_genetic_search(
            &small_problem(),
            &config,
            &mut StdRng::seed_from_u64(5),
            Some(|update: GenerationUpdate| updates.push((update.run, update.generation))),
            None::<fn() -> bool>,
        )
        .unwrap();

        assert_eq!(updates.len(), 2 * (config.generation_count + 1));
        assert_eq!(updates[0], (0, 0));
        assert_eq!(*updates.last().unwrap(), (1, config.generation_count));
        assert_eq!(result.runs[0].best_errors.len(), 2);
    }

    #[test]
    fn every_generation_keeps_population_size() {
        let config = test_config().with_runs(2);
        let mut sizes = Vec::new();
        run_genetic_search(
            &small_problem(),
            &config,
            &mut StdRng::seed_from_u64(11),
            Some(|update: GenerationUpdate| sizes.push(update.population)),
            None::<fn() -> bool>,
        )
        .unwrap();

        assert_eq!(sizes.len(), 2 * (config.generation_count + 1));
        assert!(sizes.iter().all(|&size| size == config.population_size), "{:?}", sizes);
    }

    #[test]
    fn partitioned_generations_keep_population_size() {
        let problem = small_problem();
        let config = test_config();
        let partition = PartitionConfig::new(0.0, vec![Attribute::SeatHeight, Attribute::CrankXOffset])
            .with_threshold_factor(10.0);
        let mut sizes = Vec::new();
        run_partitioned_genetic_search(
            &problem,
            &config,
            &partition,
            &mut StdRng::seed_from_u64(13),
            Some(|update: GenerationUpdate| sizes.push(update.population)),
            None::<fn() -> bool>,
        )
        .unwrap();

        assert_eq!(sizes.len(), config.generation_count + 1);
        assert!(sizes.iter().all(|&size| size == config.population_size), "{:?}", sizes);
    }

    #[test]
    fn empty_niches_are_filled_up_to_population_size() {
        // A zero threshold keeps no design in any niche, so selection comes
        // back empty and the whole selection quota is filled at random.
        let problem = small_problem();
        let config = test_config().with_percentages(50.0, 25.0, 25.0);
        let partition = PartitionConfig::new(1.0, vec![Attribute::SeatHeight]).with_threshold_factor(0.0);
        let mut pool = vec![ScoredGenome::new(1.0, Genome::default()); 4];
        assert!(OperatorSet::Partitioned(partition.clone()).select(&mut pool, 6).is_empty());

        let mut sizes = Vec::new();
        run_partitioned_genetic_search(
            &problem,
            &config,
            &partition,
            &mut StdRng::seed_from_u64(17),
            Some(|update: GenerationUpdate| sizes.push(update.population)),
            None::<fn() -> bool>,
        )
        .unwrap();

        assert_eq!(sizes.len(), config.generation_count + 1);
        assert!(sizes.iter().all(|&size| size == config.population_size), "{:?}", sizes);
    }

    #[test]
    fn stop_callback_stops_search() {
        let config = test_config().with_population(12, 100).with_runs(3);
        let mut generations = Vec::new();
        let result = run_genetic_search(
            &small_problem(),
            &config,
            &mut StdRng::seed_from_u64(5),
            Some(|update: GenerationUpdate| generations.push(update.generation)),
            Some(|| true),
        )
        .unwrap();

        // No run started, so nothing is reported.
        assert!(generations.is_empty());
        assert!(result.best.is_empty());
    }

    #[test]
    fn partitioned_search_reports_true_minimum() {
        let problem = small_problem();
        let partition = PartitionConfig::new(0.0, vec![Attribute::SeatHeight, Attribute::CrankXOffset])
            .with_threshold_factor(10.0);
        let result = run_partitioned_genetic_search(
            &problem,
            &test_config(),
            &partition,
            &mut StdRng::seed_from_u64(9),
            None::<fn(GenerationUpdate)>,
            None::<fn() -> bool>,
        )
        .unwrap();

        assert!(!result.partitions.is_empty());
        let minimum = result
            .partitions
            .iter()
            .flatten()
            .map(|design| design.score)
            .fold(f64::INFINITY, f64::min);
        assert_eq!(result.best_error, minimum);
        // Radius 0 over the varied attributes: one design per partition.
        assert!(result.partitions.iter().all(|p| p.len() == 1));
    }

    #[test]
    fn sweep_runs_every_configuration() {
        let mut grid = GaConfigGrid::single(&test_config());
        grid.population_size = vec![8, 12];
        grid.mutation_percentage = vec![25.0, 50.0];
        let result = run_ga_sweep(
            &small_problem(),
            &grid,
            &mut StdRng::seed_from_u64(2),
            None::<fn(GenerationUpdate)>,
        )
        .unwrap();
        assert_eq!(result.runs.len(), 4);
        assert_eq!(result.best.len(), 3);
    }
}
