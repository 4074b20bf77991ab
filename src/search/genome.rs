//! Discrete design space.
//!
//! Every geometry attribute has an ordered list of legal values. A genome
//! picks one index per attribute; the search algorithms only ever work with
//! indices and convert to concrete [`GeometryParams`] for scoring.

use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::params::{Attribute, GeometryParams};

/// Ordered legal values for each of the fifteen geometry attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, Vec<f64>>", into = "BTreeMap<String, Vec<f64>>")]
pub struct DomainSet {
    domains: [Vec<f64>; Attribute::COUNT],
}

impl DomainSet {
    /// Build from domains ordered as [`Attribute::ALL`].
    pub fn new(domains: [Vec<f64>; Attribute::COUNT]) -> Result<Self, ConfigError> {
        for attr in Attribute::ALL {
            let values = &domains[attr.index()];
            if values.is_empty() {
                return Err(ConfigError::EmptyDomain(attr.name().to_string()));
            }
            if let Some(&value) = values.iter().find(|v| !v.is_finite()) {
                return Err(ConfigError::NonFiniteValue {
                    key: attr.name().to_string(),
                    value,
                });
            }
        }
        Ok(Self { domains })
    }

    /// Build from a name → values map holding exactly the fifteen attributes.
    pub fn from_named(map: BTreeMap<String, Vec<f64>>) -> Result<Self, ConfigError> {
        let mut domains: [Vec<f64>; Attribute::COUNT] = Default::default();
        let mut seen = [false; Attribute::COUNT];

        for (name, values) in map {
            let attr: Attribute = name.parse()?;
            domains[attr.index()] = values;
            seen[attr.index()] = true;
        }

        if let Some(missing) = Attribute::ALL.iter().find(|attr| !seen[attr.index()]) {
            return Err(ConfigError::MissingKey(missing.name().to_string()));
        }

        Self::new(domains)
    }

    /// Design space holding exactly one design.
    pub fn single(params: &GeometryParams) -> Self {
        Self {
            domains: params.values().map(|value| vec![value]),
        }
    }

    pub fn domain(&self, attr: Attribute) -> &[f64] {
        &self.domains[attr.index()]
    }

    /// Number of distinct designs, saturating at `u128::MAX`.
    pub fn combination_count(&self) -> u128 {
        self.domains
            .iter()
            .fold(1u128, |acc, values| acc.saturating_mul(values.len() as u128))
    }

    /// Concrete parameters for a genome.
    ///
    /// # Panics
    /// If the genome was not drawn from a design space with the same shape.
    pub fn to_params(&self, genome: &Genome) -> GeometryParams {
        GeometryParams::from_values(Attribute::ALL.map(|attr| self.domains[attr.index()][genome.index(attr)]))
    }

    /// Whether every index of `genome` is in range for this design space.
    pub fn contains(&self, genome: &Genome) -> bool {
        Attribute::ALL
            .iter()
            .all(|attr| genome.index(*attr) < self.domains[attr.index()].len())
    }

    /// Uniformly random index for every attribute.
    pub fn random_genome<R: Rng + ?Sized>(&self, rng: &mut R) -> Genome {
        Genome {
            indices: Attribute::ALL.map(|attr| rng.gen_range(0..self.domains[attr.index()].len())),
        }
    }

    /// Draw fresh random indices for `attributes`, leaving the rest alone.
    pub fn randomize<R: Rng + ?Sized>(&self, genome: &mut Genome, attributes: &[Attribute], rng: &mut R) {
        for &attr in attributes {
            genome.set(attr, rng.gen_range(0..self.domains[attr.index()].len()));
        }
    }

    /// Every genome in the design space.
    ///
    /// Ordered like nested loops over [`Attribute::ALL`]: the first attribute
    /// changes slowest, the last fastest.
    pub fn genomes(&self) -> GenomeIter<'_> {
        GenomeIter {
            domains: self,
            next: Some(Genome::default()),
        }
    }
}

impl TryFrom<BTreeMap<String, Vec<f64>>> for DomainSet {
    type Error = ConfigError;

    fn try_from(map: BTreeMap<String, Vec<f64>>) -> Result<Self, Self::Error> {
        Self::from_named(map)
    }
}

impl From<DomainSet> for BTreeMap<String, Vec<f64>> {
    fn from(set: DomainSet) -> Self {
        Attribute::ALL
            .into_iter()
            .zip(set.domains)
            .map(|(attr, values)| (attr.name().to_string(), values))
            .collect()
    }
}

/// Index into each attribute's domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Genome {
    indices: [usize; Attribute::COUNT],
}

impl Genome {
    /// Genome with explicit indices ordered as [`Attribute::ALL`].
    pub fn from_indices(indices: [usize; Attribute::COUNT]) -> Self {
        Self { indices }
    }

    pub fn index(&self, attr: Attribute) -> usize {
        self.indices[attr.index()]
    }

    pub fn set(&mut self, attr: Attribute, index: usize) {
        self.indices[attr.index()] = index;
    }

    pub fn indices(&self) -> &[usize; Attribute::COUNT] {
        &self.indices
    }
}

/// Odometer over all genomes of a [`DomainSet`].
#[derive(Debug, Clone)]
pub struct GenomeIter<'a> {
    domains: &'a DomainSet,
    next: Option<Genome>,
}

impl Iterator for GenomeIter<'_> {
    type Item = Genome;

    fn next(&mut self) -> Option<Genome> {
        let current = self.next?;

        let mut following = current;
        let mut carried = true;
        for attr in Attribute::ALL.iter().rev() {
            let len = self.domains.domain(*attr).len();
            let index = following.index(*attr) + 1;
            if index < len {
                following.set(*attr, index);
                carried = false;
                break;
            }
            following.set(*attr, 0);
        }
        self.next = if carried { None } else { Some(following) };

        Some(current)
    }
}

/// Distinct attributes chosen uniformly at random.
///
/// `count` is clamped to the number of attributes.
pub fn sample_attributes<R: Rng + ?Sized>(rng: &mut R, count: usize) -> Vec<Attribute> {
    rand::seq::index::sample(rng, Attribute::COUNT, count.min(Attribute::COUNT))
        .into_iter()
        .map(|i| Attribute::ALL[i])
        .collect()
}
