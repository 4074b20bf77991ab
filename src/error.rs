//! Error types for configuration loading and search setup.
//!
//! Infeasible designs are not errors: they score `f64::INFINITY` and rank last.

/// Problems with parameter records or configuration text.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unknown attribute `{0}`")]
    UnknownAttribute(String),
    #[error("missing required key `{0}`")]
    MissingKey(String),
    #[error("unexpected key `{0}`")]
    UnexpectedKey(String),
    #[error("value for `{key}` must be finite, got {value}")]
    NonFiniteValue { key: String, value: f64 },
    #[error("domain for `{0}` has no values")]
    EmptyDomain(String),
    #[error("segment mass fractions must sum to 1, got {0}")]
    MassFractionSum(f64),
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("line {line}: `{key}` range never reaches its end value")]
    InvalidRange { line: usize, key: String },
    #[error("`{key}` must be a non-negative whole number, got {value}")]
    InvalidCount { key: String, value: f64 },
    #[error("duplicate key `{0}`")]
    DuplicateKey(String),
    #[error("no riders defined")]
    NoRiders,
    #[error("target curve has no values")]
    EmptyCurve,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        ConfigError::Parse {
            line,
            message: message.into(),
        }
    }
}

/// Misconfigurations that abort a search before the first generation.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error(
        "operator counts ({selection} selected + {crossover} crossover + {mutation} mutation) exceed population size {population_size}"
    )]
    OperatorCountsExceedPopulation {
        selection: usize,
        crossover: usize,
        mutation: usize,
        population_size: usize,
    },
    #[error("{operator} gene count {requested} exceeds the {available} available attributes")]
    GeneCountTooLarge {
        operator: &'static str,
        requested: usize,
        available: usize,
    },
    #[error("crossover and mutation need parents but selection and random fill produce none")]
    EmptyParentPool,
    #[error("population size must be non-zero")]
    EmptyPopulation,
    #[error("num_runs must be at least 1")]
    NoRuns,
    #[error("`{name}` = {value} is outside [0, 100]")]
    PercentageOutOfRange { name: &'static str, value: f64 },
    #[error("partition radius must be finite and non-negative, got {0}")]
    InvalidRadius(f64),
    #[error("partition threshold factor must be finite, got {0}")]
    InvalidThresholdFactor(f64),
    #[error("partition attributes must not be empty")]
    NoPartitionAttributes,
    #[error("at least one rider is required")]
    NoRiders,
    #[error(transparent)]
    Config(#[from] ConfigError),
}
