//! R-partitioning.
//!
//! Groups scored genomes into niches around good seeds so that selection can
//! keep several distinct local optima alive. Distances are measured between
//! domain indices over a chosen subset of attributes, so a radius of 1 means
//! "one domain step along one attribute".

use crate::params::Attribute;

use super::genome::Genome;
use super::types::{PartitionConfig, PartitionMode, ScoredGenome};

/// Mean of the finite scores times `factor`, or 0 when no score is finite.
pub fn partition_threshold(points: &[ScoredGenome], factor: f64) -> f64 {
    let (sum, count) = points
        .iter()
        .filter(|p| p.score.is_finite())
        .fold((0.0, 0usize), |(sum, count), p| (sum + p.score, count + 1));
    if count == 0 {
        return 0.0;
    }
    sum / count as f64 * factor
}

/// Euclidean distance between two genomes in index space.
pub fn genome_distance(a: &Genome, b: &Genome, attributes: &[Attribute]) -> f64 {
    attributes
        .iter()
        .map(|&attr| {
            let d = a.index(attr) as f64 - b.index(attr) as f64;
            d * d
        })
        .sum::<f64>()
        .sqrt()
}

/// Partition `points` into disjoint niches.
///
/// Only finite scores on the kept side of the threshold take part. The best
/// remaining candidate seeds a niche that absorbs every remaining candidate
/// within `radius` of it; this repeats until no candidates are left.
/// Returned partitions hold indices into `points` in ascending order.
pub fn r_partition(points: &[ScoredGenome], config: &PartitionConfig) -> Vec<Vec<usize>> {
    let threshold = partition_threshold(points, config.threshold_factor);

    let mut candidates: Vec<usize> = (0..points.len())
        .filter(|&i| {
            let score = points[i].score;
            score.is_finite()
                && match config.mode {
                    PartitionMode::Min => score <= threshold,
                    PartitionMode::Max => score >= threshold,
                }
        })
        .collect();

    candidates.sort_by(|&a, &b| match config.mode {
        PartitionMode::Min => points[a].score.total_cmp(&points[b].score),
        PartitionMode::Max => points[b].score.total_cmp(&points[a].score),
    });

    let mut partitions = Vec::new();
    while let Some(&seed) = candidates.first() {
        let seed_genome = points[seed].genome;
        let (mut members, rest): (Vec<usize>, Vec<usize>) = candidates
            .into_iter()
            .partition(|&i| genome_distance(&points[i].genome, &seed_genome, &config.attributes) <= config.radius);
        members.sort_unstable();
        partitions.push(members);
        candidates = rest;
    }

    log::debug!(
        "r-partition: {} points, threshold {:.6}, {} partitions",
        points.len(),
        threshold,
        partitions.len()
    );

    partitions
}
