//! Selection operators for the genetic search.
//!
//! Selection removes the chosen entries from the ranked pool so the random
//! fill that follows only draws from what is left.

use std::collections::HashSet;

use rand::Rng;

use super::genome::{DomainSet, Genome};
use super::partition::r_partition;
use super::types::{PartitionConfig, ScoredGenome};

/// Which selection strategy a genetic search uses.
///
/// Crossover and mutation are shared; only selection differs.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum OperatorSet {
    /// Keep the best-ranked genomes.
    #[default]
    Unpartitioned,
    /// Cluster the ranked pool into niches and take from each in turn.
    Partitioned(PartitionConfig),
}

impl OperatorSet {
    /// Select up to `count` genomes from an ascending-ranked pool.
    ///
    /// The partitioned strategy may return fewer than `count` when the
    /// niches run dry.
    pub fn select(&self, ranked: &mut Vec<ScoredGenome>, count: usize) -> Vec<Genome> {
        match self {
            OperatorSet::Unpartitioned => select_top(ranked, count),
            OperatorSet::Partitioned(config) => {
                let partitions = r_partition(ranked, config);
                select_round_robin(ranked, &partitions, count)
            }
        }
    }
}

/// Take the `count` best entries of an ascending-ranked pool.
pub fn select_top(ranked: &mut Vec<ScoredGenome>, count: usize) -> Vec<Genome> {
    let count = count.min(ranked.len());
    ranked.drain(..count).map(|scored| scored.genome).collect()
}

/// Cycle over `partitions`, taking the best remaining member of each in
/// turn, until `count` genomes are chosen or every partition is empty.
///
/// `partitions` hold indices into `ranked`, each ordered best-first.
pub fn select_round_robin(
    ranked: &mut Vec<ScoredGenome>,
    partitions: &[Vec<usize>],
    count: usize,
) -> Vec<Genome> {
    let mut cursors = vec![0usize; partitions.len()];
    let mut chosen = Vec::with_capacity(count);

    'rounds: while chosen.len() < count {
        let mut progressed = false;
        for (members, cursor) in partitions.iter().zip(cursors.iter_mut()) {
            if chosen.len() == count {
                break 'rounds;
            }
            if let Some(&index) = members.get(*cursor) {
                chosen.push(index);
                *cursor += 1;
                progressed = true;
            }
        }
        if !progressed {
            break;
        }
    }

    let selected = chosen.iter().map(|&index| ranked[index].genome).collect();

    let taken: HashSet<usize> = chosen.into_iter().collect();
    let mut position = 0;
    ranked.retain(|_| {
        let keep = !taken.contains(&position);
        position += 1;
        keep
    });

    selected
}

/// Top the parent pool up with `count` genomes: random survivors from the
/// unselected pool first, then fresh random genomes.
pub fn random_fill<R: Rng + ?Sized>(
    remaining: &mut Vec<ScoredGenome>,
    count: usize,
    domains: &DomainSet,
    rng: &mut R,
) -> Vec<Genome> {
    let mut filled = Vec::with_capacity(count);
    while filled.len() < count && !remaining.is_empty() {
        let index = rng.gen_range(0..remaining.len());
        filled.push(remaining.remove(index).genome);
    }
    while filled.len() < count {
        filled.push(domains.random_genome(rng));
    }
    filled
}
