//! Line-oriented text configuration.
//!
//! Every file is a list of `name = value` lines. Blank lines are skipped and
//! `#` starts a comment. A value is one of
//!
//! * a number: `seat_height = 0.9`
//! * a list: `seat_height = [0.8, 0.85, 0.9]`
//! * an inclusive range: `seat_height = 0.8 to 0.9 by 0.05`
//! * a word: `rider_name = alice`, or a list of words
//!
//! Curve files are the exception: one number per line.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use crate::error::ConfigError;
use crate::params::{Attribute, RiderParams};
use crate::search::{DomainSet, GaConfig, GaConfigGrid, PartitionConfig, PartitionMode};
use crate::types::DEFAULT_THRESHOLD_FACTOR;

/// Relative slack when deciding that a range step has reached its end.
const RANGE_TOL: f64 = 1e-9;

/// Keys of a GA file, in sweep order after `num_runs`.
const GA_KEYS: [&str; 8] = [
    "num_runs",
    "selection_percentage",
    "cross_over_percentage",
    "mutation_percentage",
    "cross_over_gene_count",
    "mutation_gene_count",
    "generation_count",
    "population_size",
];

#[derive(Debug, Clone, PartialEq)]
enum Value {
    Number(f64),
    Numbers(Vec<f64>),
    Word(String),
    Words(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
struct Entry {
    line: usize,
    key: String,
    value: Value,
}

fn is_word(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_alphanumeric() || c == '_')
}

fn strip_comment(line: &str) -> &str {
    line.split_once('#').map_or(line, |(before, _)| before).trim()
}

/// Values of an inclusive range. `None` when the step is zero or moves away
/// from `end`. A step landing on or past `end` contributes `end` itself;
/// iteration stops once a step would no longer move closer to `end`.
pub fn expand_range(start: f64, end: f64, step: f64) -> Option<Vec<f64>> {
    if step == 0.0 || (end - (start + step)).abs() >= (end - start).abs() {
        return None;
    }

    let slack = step.abs() * RANGE_TOL;
    let mut values = vec![start];
    let mut value = start + step;
    let mut previous = (end - start).abs();
    let mut current = (end - value).abs();

    while previous > current {
        let reached = if step > 0.0 { value >= end - slack } else { value <= end + slack };
        if reached {
            values.push(end);
            break;
        }
        values.push(value);
        value += step;
        previous = current;
        current = (end - value).abs();
    }

    Some(values)
}

fn parse_number(line: usize, text: &str) -> Result<f64, ConfigError> {
    text.parse::<f64>()
        .map_err(|_| ConfigError::parse(line, format!("`{}` is not a number", text)))
}

fn parse_value(line: usize, key: &str, text: &str) -> Result<Value, ConfigError> {
    if let Some(inner) = text.strip_prefix('[').and_then(|rest| rest.strip_suffix(']')) {
        let items: Vec<&str> = inner.split(',').map(str::trim).collect();
        if items.iter().any(|item| item.is_empty()) {
            return Err(ConfigError::parse(line, format!("empty item in list for `{}`", key)));
        }
        if let Ok(numbers) = items.iter().map(|item| item.parse::<f64>()).collect::<Result<Vec<_>, _>>() {
            return Ok(Value::Numbers(numbers));
        }
        if items.iter().all(|item| is_word(item)) {
            return Ok(Value::Words(items.iter().map(|item| item.to_string()).collect()));
        }
        return Err(ConfigError::parse(line, format!("mixed list for `{}`", key)));
    }

    let tokens: Vec<&str> = text.split_whitespace().collect();
    if let [start, "to", end, "by", step] = tokens.as_slice() {
        let start = parse_number(line, start)?;
        let end = parse_number(line, end)?;
        let step = parse_number(line, step)?;
        return expand_range(start, end, step)
            .map(Value::Numbers)
            .ok_or_else(|| ConfigError::InvalidRange {
                line,
                key: key.to_string(),
            });
    }

    if let Ok(number) = text.parse::<f64>() {
        return Ok(Value::Number(number));
    }
    if is_word(text) {
        return Ok(Value::Word(text.to_string()));
    }
    Err(ConfigError::parse(line, format!("cannot read value `{}`", text)))
}

fn parse_entries(text: &str) -> Result<Vec<Entry>, ConfigError> {
    let mut entries = Vec::new();
    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        let content = strip_comment(raw);
        if content.is_empty() {
            continue;
        }

        let (key, value) = content
            .split_once('=')
            .ok_or_else(|| ConfigError::parse(line, "expected `name = value`"))?;
        let key = key.trim();
        if !is_word(key) {
            return Err(ConfigError::parse(line, format!("invalid name `{}`", key)));
        }

        entries.push(Entry {
            line,
            key: key.to_string(),
            value: parse_value(line, key, value.trim())?,
        });
    }
    Ok(entries)
}

/// Collect number and list entries into a name → values map.
fn numeric_lists(entries: Vec<Entry>) -> Result<BTreeMap<String, Vec<f64>>, ConfigError> {
    let mut map = BTreeMap::new();
    for entry in entries {
        let values = match entry.value {
            Value::Number(value) => vec![value],
            Value::Numbers(values) => values,
            Value::Word(_) | Value::Words(_) => {
                return Err(ConfigError::parse(
                    entry.line,
                    format!("`{}` takes numbers", entry.key),
                ));
            }
        };
        if map.insert(entry.key.clone(), values).is_some() {
            return Err(ConfigError::DuplicateKey(entry.key));
        }
    }
    Ok(map)
}

/// Parse a bike parameter file into a design space.
pub fn parse_domain_set(text: &str) -> Result<DomainSet, ConfigError> {
    DomainSet::from_named(numeric_lists(parse_entries(text)?)?)
}

/// Parse a rider file. Each rider starts with `rider_name = <name>` and
/// lists its nine measurements as single numbers.
pub fn parse_riders(text: &str) -> Result<Vec<RiderParams>, ConfigError> {
    let mut riders = Vec::new();
    let mut current: Option<(String, BTreeMap<String, f64>)> = None;

    for entry in parse_entries(text)? {
        match entry.value {
            Value::Word(name) if entry.key == "rider_name" => {
                if let Some((previous, measurements)) = current.take() {
                    riders.push(RiderParams::from_map(previous, &measurements)?);
                }
                current = Some((name, BTreeMap::new()));
            }
            Value::Number(value) => {
                let Some((_, measurements)) = current.as_mut() else {
                    return Err(ConfigError::parse(entry.line, "measurement before `rider_name`"));
                };
                if measurements.insert(entry.key.clone(), value).is_some() {
                    return Err(ConfigError::DuplicateKey(entry.key));
                }
            }
            Value::Numbers(_) => {
                return Err(ConfigError::parse(
                    entry.line,
                    format!("rider measurement `{}` takes a single value", entry.key),
                ));
            }
            Value::Word(_) | Value::Words(_) => {
                return Err(ConfigError::parse(
                    entry.line,
                    format!("`{}` does not take a name", entry.key),
                ));
            }
        }
    }

    if let Some((name, measurements)) = current {
        riders.push(RiderParams::from_map(name, &measurements)?);
    }
    if riders.is_empty() {
        return Err(ConfigError::NoRiders);
    }
    Ok(riders)
}

/// Parse a target curve: one number per line.
pub fn parse_curve(text: &str) -> Result<Vec<f64>, ConfigError> {
    let mut curve = Vec::new();
    for (index, raw) in text.lines().enumerate() {
        let content = strip_comment(raw);
        if content.is_empty() {
            continue;
        }
        curve.push(parse_number(index + 1, content)?);
    }
    if curve.is_empty() {
        return Err(ConfigError::EmptyCurve);
    }
    Ok(curve)
}

fn count_value(key: &str, value: f64) -> Result<usize, ConfigError> {
    if !value.is_finite() || value < 0.0 || value.fract() != 0.0 {
        return Err(ConfigError::InvalidCount {
            key: key.to_string(),
            value,
        });
    }
    Ok(value as usize)
}

fn count_values(key: &str, values: &[f64]) -> Result<Vec<usize>, ConfigError> {
    values.iter().map(|&value| count_value(key, value)).collect()
}

/// Parse a GA file. Every key may hold a list; the grid sweeps their
/// Cartesian product. Only the first `num_runs` value is used.
pub fn parse_ga_config_grid(text: &str) -> Result<GaConfigGrid, ConfigError> {
    let mut map = numeric_lists(parse_entries(text)?)?;

    if let Some(extra) = map.keys().find(|key| !GA_KEYS.contains(&key.as_str())) {
        return Err(ConfigError::UnexpectedKey(extra.clone()));
    }
    let mut take = |key: &str| map.remove(key).ok_or_else(|| ConfigError::MissingKey(key.to_string()));

    let num_runs = take("num_runs")?;
    let selection_percentage = take("selection_percentage")?;
    let cross_over_percentage = take("cross_over_percentage")?;
    let mutation_percentage = take("mutation_percentage")?;
    let cross_over_gene_count = take("cross_over_gene_count")?;
    let mutation_gene_count = take("mutation_gene_count")?;
    let generation_count = take("generation_count")?;
    let population_size = take("population_size")?;

    Ok(GaConfigGrid {
        num_runs: count_value("num_runs", num_runs[0])?,
        selection_percentage,
        cross_over_percentage,
        mutation_percentage,
        cross_over_gene_count: count_values("cross_over_gene_count", &cross_over_gene_count)?,
        mutation_gene_count: count_values("mutation_gene_count", &mutation_gene_count)?,
        generation_count: count_values("generation_count", &generation_count)?,
        population_size: count_values("population_size", &population_size)?,
        sample_count: GaConfig::default().sample_count,
    })
}

/// Parse a partitioning file: `radius = r` and `attributes = [a, b]`, plus
/// optional `mode = min|max` and `threshold_factor = f`.
pub fn parse_partition_config(text: &str) -> Result<PartitionConfig, ConfigError> {
    let mut radius = None;
    let mut attributes = None;
    let mut mode = PartitionMode::Min;
    let mut threshold_factor = DEFAULT_THRESHOLD_FACTOR;
    let mut seen = BTreeSet::new();

    for entry in parse_entries(text)? {
        if !seen.insert(entry.key.clone()) {
            return Err(ConfigError::DuplicateKey(entry.key));
        }
        match (entry.key.as_str(), entry.value) {
            ("radius", Value::Number(value)) => radius = Some(value),
            ("threshold_factor", Value::Number(value)) => threshold_factor = value,
            ("attributes", Value::Words(names)) => {
                let parsed = names
                    .iter()
                    .map(|name| name.parse::<Attribute>())
                    .collect::<Result<Vec<_>, _>>()?;
                attributes = Some(parsed);
            }
            ("attributes", Value::Word(name)) => attributes = Some(vec![name.parse::<Attribute>()?]),
            ("mode", Value::Word(word)) => {
                mode = match word.as_str() {
                    "min" => PartitionMode::Min,
                    "max" => PartitionMode::Max,
                    _ => return Err(ConfigError::parse(entry.line, "mode must be `min` or `max`")),
                };
            }
            ("radius" | "threshold_factor" | "attributes" | "mode", _) => {
                return Err(ConfigError::parse(
                    entry.line,
                    format!("wrong kind of value for `{}`", entry.key),
                ));
            }
            _ => return Err(ConfigError::UnexpectedKey(entry.key.clone())),
        }
    }

    let radius = radius.ok_or_else(|| ConfigError::MissingKey("radius".to_string()))?;
    let attributes = attributes.ok_or_else(|| ConfigError::MissingKey("attributes".to_string()))?;

    Ok(PartitionConfig::new(radius, attributes)
        .with_mode(mode)
        .with_threshold_factor(threshold_factor))
}

/// Read a file and hand its text to `parse`.
pub fn read_config_file<T, P>(path: P, parse: fn(&str) -> Result<T, ConfigError>) -> Result<T, ConfigError>
where
    P: AsRef<Path>,
{
    let text = fs::read_to_string(path)?;
    parse(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-12;

    fn assert_values(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len(), "{:?} vs {:?}", actual, expected);
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < TOL, "{:?} vs {:?}", actual, expected);
        }
    }

    #[test]
    fn range_includes_both_ends() {
        assert_values(&expand_range(0.0, 1.0, 0.25).unwrap(), &[0.0, 0.25, 0.5, 0.75, 1.0]);
    }

    #[test]
    fn range_stops_before_moving_away_from_end() {
        assert_values(&expand_range(0.0, 1.0, 0.3).unwrap(), &[0.0, 0.3, 0.6, 0.9]);
        assert_values(&expand_range(0.0, 1.0, 0.6).unwrap(), &[0.0, 0.6, 1.0]);
    }

    #[test]
    fn range_absorbs_rounding_drift() {
        let values = expand_range(0.0, 1.0, 0.1).unwrap();
        assert_eq!(values.len(), 11);
        assert_eq!(*values.last().unwrap(), 1.0);
    }

    #[test]
    fn descending_range() {
        assert_values(&expand_range(10.0, 4.0, -3.0).unwrap(), &[10.0, 7.0, 4.0]);
    }

    #[test]
    fn bad_ranges_are_rejected() {
        assert!(expand_range(0.0, 1.0, 0.0).is_none());
        assert!(expand_range(0.0, 1.0, -0.5).is_none());
        assert!(expand_range(0.0, 1.0, 2.0).is_none());
        assert!(expand_range(1.0, 1.0, 0.5).is_none());
    }

    #[test]
    fn values_of_every_kind() {
        let entries = parse_entries(
            "# header\n\
             a = 1.5   # trailing\n\
             \n\
             b = [1, 2,3]\n\
             c = 1 to 2 by 0.5\n\
             d = bob\n\
             e = [seat_height, wheelbase]\n",
        )
        .unwrap();
        let values: Vec<&Value> = entries.iter().map(|e| &e.value).collect();
        assert_eq!(values[0], &Value::Number(1.5));
        assert_eq!(values[1], &Value::Numbers(vec![1.0, 2.0, 3.0]));
        assert_eq!(values[2], &Value::Numbers(vec![1.0, 1.5, 2.0]));
        assert_eq!(values[3], &Value::Word("bob".to_string()));
        assert_eq!(
            values[4],
            &Value::Words(vec!["seat_height".to_string(), "wheelbase".to_string()])
        );
        assert_eq!(entries[1].line, 4);
    }

    #[test]
    fn malformed_line_reports_line_number() {
        let err = parse_entries("a = 1\nthis is wrong\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { line: 2, .. }));

        let err = parse_entries("a = 1\nb = 3 to 1 by 1\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRange { line: 2, ref key } if key == "b"));
    }

    const RIDERS: &str = "\
rider_name = alice
rider_mass = 70
head_diameter = 0.2
torso_length = 0.6
torso_depth = 0.25
torso_width = 0.4
arm_length = 0.6
arm_diameter = 0.08
leg_length = 0.9
leg_diameter = 0.12

rider_name = bob
rider_mass = 80
head_diameter = 0.22
torso_length = 0.65
torso_depth = 0.28
torso_width = 0.42
arm_length = 0.65
arm_diameter = 0.09
leg_length = 0.95
leg_diameter = 0.13
";

    #[test]
    fn riders_split_on_name() {
        let riders = parse_riders(RIDERS).unwrap();
        assert_eq!(riders.len(), 2);
        assert_eq!(riders[0], crate::params::tests::sample_rider());
        assert_eq!(riders[1].name, "bob");
        assert_eq!(riders[1].leg_diameter, 0.13);
    }

    #[test]
    fn rider_ranges_are_rejected() {
        let text = RIDERS.replace("rider_mass = 70", "rider_mass = [60, 70]");
        assert!(matches!(parse_riders(&text), Err(ConfigError::Parse { line: 2, .. })));
    }

    #[test]
    fn rider_missing_measurement_is_rejected() {
        let text = RIDERS.replace("leg_length = 0.9\n", "");
        assert!(matches!(parse_riders(&text), Err(ConfigError::MissingKey(key)) if key == "leg_length"));
    }

    #[test]
    fn empty_rider_file_is_rejected() {
        assert!(matches!(parse_riders("# nobody\n"), Err(ConfigError::NoRiders)));
    }

    #[test]
    fn curve_is_one_value_per_line() {
        let curve = parse_curve("0\n0.5  # note\n\n1.25\n").unwrap();
        assert_eq!(curve, vec![0.0, 0.5, 1.25]);
        assert!(matches!(parse_curve("\n# none\n"), Err(ConfigError::EmptyCurve)));
        assert!(matches!(parse_curve("1\nx = 2\n"), Err(ConfigError::Parse { line: 2, .. })));
    }

    #[test]
    fn ga_grid_reads_lists_and_ranges() {
        let grid = parse_ga_config_grid(
            "num_runs = 3\n\
             selection_percentage = [10, 20]\n\
             cross_over_percentage = 40\n\
             mutation_percentage = 40\n\
             cross_over_gene_count = 3\n\
             mutation_gene_count = 1 to 3 by 1\n\
             generation_count = 50\n\
             population_size = 100\n",
        )
        .unwrap();
        assert_eq!(grid.num_runs, 3);
        assert_eq!(grid.selection_percentage, vec![10.0, 20.0]);
        assert_eq!(grid.mutation_gene_count, vec![1, 2, 3]);
        assert_eq!(grid.expand().len(), 6);
    }

    #[test]
    fn ga_grid_rejects_fractional_counts() {
        let err = parse_ga_config_grid(
            "num_runs = 1\nselection_percentage = 10\ncross_over_percentage = 40\n\
             mutation_percentage = 40\ncross_over_gene_count = 2.5\nmutation_gene_count = 1\n\
             generation_count = 5\npopulation_size = 10\n",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidCount { .. }));
    }

    #[test]
    fn ga_grid_requires_every_key() {
        let err = parse_ga_config_grid("num_runs = 1\n").unwrap_err();
        assert!(matches!(err, ConfigError::MissingKey(key) if key == "selection_percentage"));
    }

    #[test]
    fn partition_file() {
        let config = parse_partition_config("radius = 2\nattributes = [seat_height, crank_x_offset]\n").unwrap();
        assert_eq!(config.radius, 2.0);
        assert_eq!(config.attributes, vec![Attribute::SeatHeight, Attribute::CrankXOffset]);
        assert_eq!(config.mode, PartitionMode::Min);

        let config = parse_partition_config("radius = 1\nattributes = wheelbase\nmode = max\n").unwrap();
        assert_eq!(config.attributes, vec![Attribute::Wheelbase]);
        assert_eq!(config.mode, PartitionMode::Max);
    }

    #[test]
    fn partition_file_rejects_unknown_attribute() {
        let err = parse_partition_config("radius = 1\nattributes = [stem]\n").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownAttribute(name) if name == "stem"));
    }

    #[test]
    fn partition_file_rejects_repeated_keys() {
        let err = parse_partition_config("radius = 1\nradius = 5\nattributes = [seat_height]\n").unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateKey(key) if key == "radius"));

        let err = parse_partition_config("radius = 1\nattributes = [seat_height]\nmode = min\nmode = max\n").unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateKey(key) if key == "mode"));
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        let err = numeric_lists(parse_entries("a = 1\na = 2\n").unwrap()).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateKey(key) if key == "a"));
    }
}
