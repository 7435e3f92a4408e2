/// Parser for Cobertura XML coverage reports.
///
/// Cobertura XML structure:
///   <coverage line-rate="..." timestamp="...">
///     <sources><source>...</source></sources>
///     <packages>
///       <package name="...">
///         <classes>
///           <class name="..." filename="..." line-rate="..." branch-rate="...">
///             <methods>...</methods>
///             <lines>...</lines>
///           </class>
///         </classes>
///       </package>
///     </packages>
///   </coverage>
///
/// Only the class-level and document-level `line-rate` are used; line and
/// method detail is ignored.
use serde::Deserialize;
use serde_json::Value;

use super::{build_snapshot, one_or_many, parse_rate, parse_timestamp, Parser};
use crate::error::{CovdiffError, Result};
use crate::model::CoverageSnapshot;
use crate::util::round_percentage;

pub struct CoberturaParser;

impl Parser for CoberturaParser {
    fn parse(&self, tree: &Value) -> Result<CoverageSnapshot> {
        parse(tree)
    }
}

#[derive(Debug, Deserialize)]
struct Document {
    coverage: Coverage,
}

#[derive(Debug, Deserialize)]
struct Coverage {
    #[serde(rename = "@_line-rate")]
    line_rate: Option<String>,
    #[serde(rename = "@_timestamp")]
    timestamp: Option<String>,
    sources: Option<Sources>,
    packages: Packages,
}

#[derive(Debug, Deserialize)]
struct Sources {
    #[serde(default, deserialize_with = "one_or_many")]
    source: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct Packages {
    #[serde(default, deserialize_with = "one_or_many")]
    package: Vec<Package>,
}

#[derive(Debug, Deserialize)]
struct Package {
    classes: Option<Classes>,
}

#[derive(Debug, Deserialize)]
struct Classes {
    #[serde(default, deserialize_with = "one_or_many")]
    class: Vec<Class>,
}

#[derive(Debug, Deserialize)]
struct Class {
    #[serde(rename = "@_filename")]
    filename: Option<String>,
    #[serde(rename = "@_line-rate")]
    line_rate: Option<String>,
}

fn rate_to_percentage(rate: Option<&str>) -> f64 {
    round_percentage(parse_rate(rate) * 100.0)
}

/// Parse a Cobertura tree into a snapshot.
pub fn parse(tree: &Value) -> Result<CoverageSnapshot> {
    let doc = Document::deserialize(tree).map_err(CovdiffError::Schema)?;
    let coverage = doc.coverage;

    // `<source/>` decodes as an empty object; only text entries are usable.
    let sources: Vec<String> = coverage
        .sources
        .map(|s| s.source)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|v| match v {
            Value::String(s) => Some(s),
            _ => None,
        })
        .collect();

    let entries: Vec<(String, f64)> = coverage
        .packages
        .package
        .iter()
        .filter_map(|p| p.classes.as_ref())
        .flat_map(|c| c.class.iter())
        .map(|class| {
            let filename = class.filename.as_deref().unwrap_or_default();
            (
                resolve_source_path(filename, &sources),
                rate_to_percentage(class.line_rate.as_deref()),
            )
        })
        .collect();

    build_snapshot(
        entries,
        rate_to_percentage(coverage.line_rate.as_deref()),
        parse_timestamp(coverage.timestamp.as_deref()),
    )
}

/// Resolve a class filename against the `<source>` roots.
///
/// Absolute filenames are kept as-is. Relative ones are joined onto the first
/// non-empty source root; with no usable root they stay relative.
fn resolve_source_path(filename: &str, sources: &[String]) -> String {
    if is_absolute(filename) {
        return filename.to_string();
    }
    for source in sources {
        let base = source.trim().trim_end_matches(['/', '\\']);
        if !base.is_empty() {
            return format!("{}/{}", base, filename);
        }
    }
    filename.to_string()
}

fn is_absolute(path: &str) -> bool {
    if path.starts_with('/') || path.starts_with('\\') {
        return true;
    }
    // Windows drive letter, e.g. `C:\` or `C:/`.
    let bytes = path.as_bytes();
    bytes.len() >= 3
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && (bytes[2] == b'\\' || bytes[2] == b'/')
}
