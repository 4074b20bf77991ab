//! Crossover operator for the genetic search.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::params::Attribute;

use super::genome::Genome;

/// Child of `second` carrying `first`'s indices for `attributes`.
pub fn cross_genomes(first: &Genome, second: &Genome, attributes: &[Attribute]) -> Genome {
    let mut child = *second;
    for &attr in attributes {
        child.set(attr, first.index(attr));
    }
    child
}

/// Produce `count` children from random parent pairs.
///
/// Both parents are drawn independently from `parents`, so a genome may be
/// paired with itself. Returns no children when `parents` is empty.
pub fn crossover<R: Rng + ?Sized>(
    parents: &[Genome],
    attributes: &[Attribute],
    count: usize,
    rng: &mut R,
) -> Vec<Genome> {
    let mut children = Vec::with_capacity(count);
    for _ in 0..count {
        let (Some(first), Some(second)) = (parents.choose(rng), parents.choose(rng)) else {
            break;
        };
        children.push(cross_genomes(first, second, attributes));
    }
    children
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn uniform(index: usize) -> Genome {
        Genome::from_indices([index; Attribute::COUNT])
    }

    #[test]
    fn child_takes_chosen_genes_from_first_parent() {
        let attributes = [Attribute::Wheelbase, Attribute::SeatHeight];
        let child = cross_genomes(&uniform(1), &uniform(2), &attributes);
        for attr in Attribute::ALL {
            let expected = if attributes.contains(&attr) { 1 } else { 2 };
            assert_eq!(child.index(attr), expected);
        }
    }

    #[test]
    fn no_attributes_clones_second_parent() {
        assert_eq!(cross_genomes(&uniform(1), &uniform(2), &[]), uniform(2));
    }

    #[test]
    fn produces_requested_number_of_children() {
        let mut rng = StdRng::seed_from_u64(11);
        let parents = [uniform(0), uniform(1), uniform(2)];
        let children = crossover(&parents, &[Attribute::HipAngle], 7, &mut rng);
        assert_eq!(children.len(), 7);
        for child in &children {
            // Every gene still comes from one of the parents.
            assert!(child.indices().iter().all(|&i| i <= 2));
        }
    }

    #[test]
    fn empty_parent_pool_yields_nothing() {
        let mut rng = StdRng::seed_from_u64(11);
        assert!(crossover(&[], &[Attribute::HipAngle], 3, &mut rng).is_empty());
    }
}
