//! Mutation operator for the genetic search.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::params::Attribute;

use super::genome::{DomainSet, Genome};

/// Produce `count` mutants, each a random parent with fresh random indices
/// for `attributes`. Returns no mutants when `parents` is empty.
pub fn mutate<R: Rng + ?Sized>(
    parents: &[Genome],
    domains: &DomainSet,
    attributes: &[Attribute],
    count: usize,
    rng: &mut R,
) -> Vec<Genome> {
    let mut mutants = Vec::with_capacity(count);
    for _ in 0..count {
        let Some(parent) = parents.choose(rng) else {
            break;
        };
        let mut mutant = *parent;
        domains.randomize(&mut mutant, attributes, rng);
        mutants.push(mutant);
    }
    mutants
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::genome::tests::small_domains;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn only_chosen_attributes_change() {
        let domains = small_domains();
        let mut rng = StdRng::seed_from_u64(21);
        let mut parent = Genome::default();
        parent.set(Attribute::CrankXOffset, 2);
        parent.set(Attribute::SeatHeight, 1);

        let mutants = mutate(&[parent], &domains, &[Attribute::CrankXOffset], 50, &mut rng);
        assert_eq!(mutants.len(), 50);
        for mutant in &mutants {
            assert!(domains.contains(mutant));
            assert_eq!(mutant.index(Attribute::SeatHeight), 1);
        }
        // 50 draws over three values almost surely move the crank offset.
        assert!(mutants.iter().any(|m| m.index(Attribute::CrankXOffset) != 2));
    }

    #[test]
    fn empty_parent_pool_yields_nothing() {
        let mut rng = StdRng::seed_from_u64(21);
        assert!(mutate(&[], &small_domains(), &[Attribute::SeatHeight], 4, &mut rng).is_empty());
    }
}
