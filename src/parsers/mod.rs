pub mod clover;
pub mod cobertura;

use std::collections::BTreeMap;

use regex::Regex;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::Result;
use crate::model::{CoverageFile, CoverageSnapshot};
use crate::util::{create_identifier, determine_common_base_path, escape_regex, SEPARATOR};

/// Every format parser implements this trait.
pub trait Parser {
    /// Convert a generic XML tree into the canonical snapshot.
    fn parse(&self, tree: &Value) -> Result<CoverageSnapshot>;
}

/// Accept either a single element or a list of them and always yield a list.
///
/// XML-to-tree layers collapse single children into bare objects; this keeps
/// that ambiguity out of everything downstream.
pub(crate) fn one_or_many<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany<T> {
        Many(Vec<T>),
        One(T),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::Many(items) => items,
        OneOrMany::One(item) => vec![item],
    })
}

/// Parse an integer counter attribute. Missing or garbage values count as 0
/// and decimals are truncated.
pub(crate) fn parse_count(value: Option<&str>) -> u64 {
    let Some(v) = value.map(str::trim) else {
        return 0;
    };
    v.parse::<u64>()
        .ok()
        .or_else(|| v.parse::<f64>().ok().filter(|f| f.is_finite() && *f >= 0.0).map(|f| f as u64))
        .unwrap_or(0)
}

/// Parse a rate attribute such as `0.8055`.
pub(crate) fn parse_rate(value: Option<&str>) -> f64 {
    value
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|f| f.is_finite())
        .unwrap_or(0.0)
}

/// Parse an epoch timestamp attribute.
pub(crate) fn parse_timestamp(value: Option<&str>) -> i64 {
    let Some(v) = value.map(str::trim) else {
        return 0;
    };
    v.parse::<i64>()
        .ok()
        .or_else(|| v.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f as i64))
        .unwrap_or(0)
}

/// Assemble a snapshot from `(absolute path, percentage)` pairs.
///
/// Computes the common base path, strips `base_path + "/"` from each path at
/// most once, and keys every file by the hash of its relative path. When two
/// entries share a relative path the later one wins.
pub(crate) fn build_snapshot(
    entries: Vec<(String, f64)>,
    coverage: f64,
    timestamp: i64,
) -> Result<CoverageSnapshot> {
    let absolutes: Vec<&str> = entries.iter().map(|(path, _)| path.as_str()).collect();
    let base_path = determine_common_base_path(&absolutes, SEPARATOR);
    let prefix = Regex::new(&format!("^{}", escape_regex(&format!("{base_path}{SEPARATOR}"))))?;

    let mut files = BTreeMap::new();
    for (absolute, coverage) in entries {
        let relative = prefix.replace(&absolute, "").into_owned();
        files.insert(
            create_identifier(&relative),
            CoverageFile {
                relative,
                absolute,
                coverage,
            },
        );
    }

    Ok(CoverageSnapshot {
        files,
        coverage,
        timestamp,
        base_path,
    })
}
