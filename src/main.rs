//! Bike geometry search CLI - run searches from text configuration files.

use std::path::Path;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

use bike_geometry_search::{
    config::{
        parse_curve, parse_domain_set, parse_ga_config_grid, parse_partition_config, parse_riders,
        read_config_file,
    },
    error::ConfigError,
    evaluate_design,
    search::{run_brute_force_with_progress, run_ga_sweep, run_partitioned_ga_sweep, DesignProblem, GenerationUpdate},
    SegmentMassFractions,
};

const DEFAULT_SEED: u64 = 42;

fn print_usage(program: &str) {
    eprintln!("Usage: {} <mode> <files...>", program);
    eprintln!();
    eprintln!("Search bicycle geometries whose control sensitivity matches a target curve.");
    eprintln!();
    eprintln!("Modes:");
    eprintln!("  single      <bike> <riders> <curve>");
    eprintln!("  brute       <bike> <riders> <curve> [sample_count]");
    eprintln!("  ga          <ga> <bike> <riders> <curve> [seed]");
    eprintln!("  partitioned <ga> <partition> <bike> <riders> <curve> [seed]");
    eprintln!();
    eprintln!("Results are written to stdout as JSON; progress goes to stderr.");
    eprintln!("Set RUST_LOG=debug for detailed logging.");
}

fn load<T>(label: &str, path: &str, parse: fn(&str) -> Result<T, ConfigError>) -> T {
    read_config_file(Path::new(path), parse).unwrap_or_else(|e| {
        eprintln!("Error reading {} file {}: {}", label, path, e);
        std::process::exit(1);
    })
}

fn load_problem(bike: &str, riders: &str, curve: &str) -> DesignProblem {
    let domains = load("bike", bike, parse_domain_set);
    let riders = load("rider", riders, parse_riders);
    let target = load("curve", curve, parse_curve);
    DesignProblem::new(domains, riders, target)
}

fn parse_arg<T: std::str::FromStr>(args: &[String], index: usize, name: &str, default: T) -> T {
    match args.get(index) {
        Some(text) => text.parse().unwrap_or_else(|_| {
            eprintln!("Invalid {}: {}", name, text);
            std::process::exit(1);
        }),
        None => default,
    }
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error serializing result: {}", e);
            std::process::exit(1);
        }
    }
}

fn print_generation(update: GenerationUpdate) {
    eprintln!(
        "  run {} gen {}: best={:.6}, mean={:.6}, feasible={}/{}",
        update.run, update.generation, update.best_score, update.mean_score, update.feasible, update.population
    );
}

fn print_problem(problem: &DesignProblem) {
    eprintln!("Bike Geometry Search");
    eprintln!("====================");
    eprintln!("Candidates: {}", problem.domains.combination_count());
    eprintln!("Riders: {}", problem.riders.len());
    eprintln!("Target speeds: {}", problem.target.len());
    eprintln!();
}

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage(&args[0]);
        std::process::exit(1);
    }

    let mode = args[1].as_str();
    let required = match mode {
        "single" | "brute" => 5,
        "ga" => 6,
        "partitioned" => 7,
        _ => {
            eprintln!("Unknown mode: {}", mode);
            eprintln!();
            print_usage(&args[0]);
            std::process::exit(1);
        }
    };
    if args.len() < required {
        print_usage(&args[0]);
        std::process::exit(1);
    }

    let start = Instant::now();

    match mode {
        "single" => {
            let problem = load_problem(&args[2], &args[3], &args[4]);
            // First listed value of every attribute
            let params = problem.domains.to_params(&Default::default());
            let evaluation = evaluate_design(
                &params,
                &problem.riders,
                &problem.target,
                problem.top_speed,
                &SegmentMassFractions::default(),
            );
            eprintln!("Error: {}", evaluation.error);
            print_json(&evaluation);
        }
        "brute" => {
            let problem = load_problem(&args[2], &args[3], &args[4]);
            let sample_count: usize = parse_arg(&args, 5, "sample_count", 10);
            print_problem(&problem);

            let result = run_brute_force_with_progress(
                &problem,
                sample_count,
                Some(|evaluated: u64, total: u128| eprintln!("  {}/{} evaluated", evaluated, total)),
            )
            .unwrap_or_else(|e| {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            });
            eprintln!("{}", result);
            print_json(&result);
        }
        "ga" => {
            let grid = load("GA", &args[2], parse_ga_config_grid);
            let problem = load_problem(&args[3], &args[4], &args[5]);
            let seed: u64 = parse_arg(&args, 6, "seed", DEFAULT_SEED);
            print_problem(&problem);

            let mut rng = StdRng::seed_from_u64(seed);
            let result = run_ga_sweep(&problem, &grid, &mut rng, Some(print_generation)).unwrap_or_else(|e| {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            });
            eprintln!("{}", result);
            print_json(&result);
        }
        _ => {
            let grid = load("GA", &args[2], parse_ga_config_grid);
            let partition = load("partition", &args[3], parse_partition_config);
            let problem = load_problem(&args[4], &args[5], &args[6]);
            let seed: u64 = parse_arg(&args, 7, "seed", DEFAULT_SEED);
            print_problem(&problem);

            let mut rng = StdRng::seed_from_u64(seed);
            let result = run_partitioned_ga_sweep(&problem, &grid, &partition, &mut rng, Some(print_generation))
                .unwrap_or_else(|e| {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                });
            eprintln!("{}", result);
            print_json(&result);
        }
    }

    eprintln!("Time: {:.2}s", start.elapsed().as_secs_f32());
}
