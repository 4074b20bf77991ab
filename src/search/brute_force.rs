//! Exhaustive enumeration of the design space.
//!
//! Visits every genome of the [`DomainSet`](super::genome::DomainSet) and
//! keeps the best `sample_count` designs. The candidate count is the product
//! of all domain sizes, so this is only practical for narrow domains.

use std::cmp::Ordering;

use crate::error::SearchError;
use crate::types::PROGRESS_INTERVAL;

use super::genome::Genome;
use super::objective::{evaluate_population, DesignProblem};
use super::types::{BruteForceResult, ScoredDesign};

/// Genomes scored per batch.
const CHUNK_SIZE: usize = 4096;

/// Bounded list of the lowest-scoring entries, kept in ascending order.
#[derive(Debug, Clone)]
pub struct BestList<T> {
    capacity: usize,
    entries: Vec<(f64, T)>,
}

impl<T> BestList<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Insert when there is room or when `score` beats the current worst.
    /// Returns whether the entry was kept. Equal scores keep arrival order.
    pub fn insert(&mut self, score: f64, item: T) -> bool {
        if self.capacity == 0 {
            return false;
        }
        if self.entries.len() == self.capacity {
            let worst = self.entries[self.entries.len() - 1].0;
            if score.total_cmp(&worst) != Ordering::Less {
                return false;
            }
            self.entries.pop();
        }
        let position = self
            .entries
            .partition_point(|(existing, _)| existing.total_cmp(&score) != Ordering::Greater);
        self.entries.insert(position, (score, item));
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn worst(&self) -> Option<f64> {
        self.entries.last().map(|(score, _)| *score)
    }

    pub fn into_vec(self) -> Vec<(f64, T)> {
        self.entries
    }
}

/// Score every design and keep the best `sample_count`.
pub fn run_brute_force(problem: &DesignProblem, sample_count: usize) -> Result<BruteForceResult, SearchError> {
    run_brute_force_with_progress(problem, sample_count, None::<fn(u64, u128)>)
}

/// Like [`run_brute_force`], calling `on_progress(evaluated, total)` every
/// [`PROGRESS_INTERVAL`] candidates.
pub fn run_brute_force_with_progress<F>(
    problem: &DesignProblem,
    sample_count: usize,
    mut on_progress: Option<F>,
) -> Result<BruteForceResult, SearchError>
where
    F: FnMut(u64, u128),
{
    problem.validate()?;

    let total = problem.domains.combination_count();
    log::info!("brute force: {} candidates, {} riders", total, problem.riders.len());

    let mut best: BestList<Genome> = BestList::new(sample_count);
    let mut evaluated: u64 = 0;
    let mut feasible: u64 = 0;

    let mut genomes = problem.domains.genomes();
    loop {
        let chunk: Vec<Genome> = genomes.by_ref().take(CHUNK_SIZE).collect();
        if chunk.is_empty() {
            break;
        }

        for scored in evaluate_population(problem, chunk) {
            evaluated += 1;
            if scored.score.is_finite() {
                feasible += 1;
            }
            best.insert(scored.score, scored.genome);

            if evaluated % PROGRESS_INTERVAL == 0 {
                log::debug!(
                    "brute force: {}/{} evaluated, {} feasible, worst kept {:?}",
                    evaluated,
                    total,
                    feasible,
                    best.worst()
                );
                if let Some(ref mut progress) = on_progress {
                    progress(evaluated, total);
                }
            }
        }
    }

    log::info!("brute force: {} evaluated, {} feasible", evaluated, feasible);

    let best = best
        .into_vec()
        .into_iter()
        .map(|(score, genome)| ScoredDesign {
            score,
            params: problem.domains.to_params(&genome),
        })
        .collect();

    Ok(BruteForceResult {
        best,
        evaluated,
        feasible,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::tests::{sample_geometry, sample_rider};
    use crate::search::genome::DomainSet;
    use crate::search::objective::tests::small_problem;

    #[test]
    fn best_list_keeps_lowest_scores_in_order() {
        let mut list = BestList::new(3);
        for (score, id) in [(5.0, 'a'), (1.0, 'b'), (3.0, 'c'), (4.0, 'd'), (0.5, 'e')] {
            list.insert(score, id);
        }
        let ids: Vec<char> = list.into_vec().into_iter().map(|(_, id)| id).collect();
        assert_eq!(ids, vec!['e', 'b', 'c']);
    }

    #[test]
    fn best_list_keeps_ties_in_arrival_order() {
        let mut list = BestList::new(3);
        list.insert(1.0, 'a');
        list.insert(1.0, 'b');
        list.insert(1.0, 'c');
        assert!(!list.insert(1.0, 'd'));
        let ids: Vec<char> = list.into_vec().into_iter().map(|(_, id)| id).collect();
        assert_eq!(ids, vec!['a', 'b', 'c']);
    }

    #[test]
    fn best_list_admits_infeasible_while_room() {
        let mut list = BestList::new(2);
        assert!(list.insert(f64::INFINITY, 'x'));
        assert!(list.insert(2.0, 'y'));
        assert!(list.insert(1.0, 'z'));
        assert_eq!(list.worst(), Some(2.0));
    }

    #[test]
    fn zero_capacity_keeps_nothing() {
        let mut list = BestList::new(0);
        assert!(!list.insert(1.0, ()));
        assert!(list.is_empty());
    }

    #[test]
    fn enumerates_whole_design_space() {
        let problem = small_problem();
        let result = run_brute_force(&problem, 4).unwrap();
        assert_eq!(result.evaluated, 6);
        assert_eq!(result.feasible, 6);
        assert_eq!(result.best.len(), 4);
        for pair in result.best.windows(2) {
            assert!(pair[0].score <= pair[1].score);
        }
    }

    #[test]
    fn single_design_is_the_unique_result() {
        let problem = DesignProblem::new(
            DomainSet::single(&sample_geometry()),
            vec![sample_rider()],
            vec![0.0, 3.0, 6.0],
        );
        let result = run_brute_force(&problem, 10).unwrap();
        assert_eq!(result.evaluated, 1);
        assert_eq!(result.best.len(), 1);
        assert_eq!(result.best[0].params, sample_geometry());
    }

    #[test]
    fn infeasible_single_design_is_still_reported() {
        let mut params = sample_geometry();
        params.seat_height = 2.5;
        let problem = DesignProblem::new(DomainSet::single(&params), vec![sample_rider()], vec![0.0; 3]);
        let result = run_brute_force(&problem, 10).unwrap();
        assert_eq!(result.feasible, 0);
        assert_eq!(result.best.len(), 1);
        assert_eq!(result.best[0].score, f64::INFINITY);
    }
}
