/// Parser for Clover XML coverage reports.
///
/// Clover XML structure (as produced by OpenClover, PHPUnit,
/// `jest --coverageReporters=clover`, etc.):
///
///   <coverage generated="...">
///     <project timestamp="..." name="...">
///       <package name="...">
///         <file name="Foo.php" path="/absolute/path/to/Foo.php">
///           <class name="Foo"><metrics .../></class>
///           <line num="1" count="5" type="stmt"/>
///           <metrics statements=".." coveredstatements=".." conditionals=".."
///                    coveredconditionals=".." methods=".." coveredmethods=".."/>
///         </file>
///       </package>
///       <file .../>
///       <metrics .../>
///     </project>
///   </coverage>
///
/// Files may live under `<package>` or directly under `<project>`. `<file>` has
/// a `path` attribute with the absolute path and a `name` attribute with just
/// the filename; we prefer `path` when available.
///
/// Percentages follow Clover's own definition: covered elements
/// (conditionals + statements + methods) over total elements.
use serde::Deserialize;
use serde_json::Value;

use super::{build_snapshot, one_or_many, parse_count, parse_timestamp, Parser};
use crate::error::{CovdiffError, Result};
use crate::model::CoverageSnapshot;
use crate::util::round_percentage;

/// Clover XML format parser.
pub struct CloverParser;

impl Parser for CloverParser {
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
    project: Project,
}

#[derive(Debug, Deserialize)]
struct Project {
    #[serde(default, deserialize_with = "one_or_many")]
    package: Vec<Package>,
    #[serde(default, deserialize_with = "one_or_many")]
    file: Vec<File>,
    metrics: Option<Metrics>,
    #[serde(rename = "@_timestamp")]
    timestamp: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Package {
    #[serde(default, deserialize_with = "one_or_many")]
    file: Vec<File>,
}

#[derive(Debug, Deserialize)]
struct File {
    #[serde(rename = "@_name")]
    name: Option<String>,
    #[serde(rename = "@_path")]
    path: Option<String>,
    metrics: Option<Metrics>,
}

#[derive(Debug, Default, Deserialize)]
struct Metrics {
    #[serde(rename = "@_statements")]
    statements: Option<String>,
    #[serde(rename = "@_coveredstatements")]
    covered_statements: Option<String>,
    #[serde(rename = "@_conditionals")]
    conditionals: Option<String>,
    #[serde(rename = "@_coveredconditionals")]
    covered_conditionals: Option<String>,
    #[serde(rename = "@_methods")]
    methods: Option<String>,
    #[serde(rename = "@_coveredmethods")]
    covered_methods: Option<String>,
}

impl Metrics {
    /// Rounded percentage of covered elements, 0 when there is nothing to cover.
    fn percentage(&self) -> f64 {
        let count = |v: &Option<String>| parse_count(v.as_deref());

        let covered = count(&self.covered_conditionals)
            + count(&self.covered_statements)
            + count(&self.covered_methods);
        let total = count(&self.conditionals) + count(&self.statements) + count(&self.methods);

        let percentage = if total > 0 {
            100.0 * covered as f64 / total as f64
        } else {
            0.0
        };
        round_percentage(percentage)
    }
}

fn file_percentage(metrics: Option<&Metrics>) -> f64 {
    metrics.map(Metrics::percentage).unwrap_or(0.0)
}

/// Parse a Clover tree into a snapshot.
pub fn parse(tree: &Value) -> Result<CoverageSnapshot> {
    let doc = Document::deserialize(tree).map_err(CovdiffError::Schema)?;
    let project = doc.coverage.project;

    let entries: Vec<(String, f64)> = project
        .package
        .iter()
        .flat_map(|p| p.file.iter())
        .chain(project.file.iter())
        .map(|f| {
            let path = f.path.clone().or_else(|| f.name.clone()).unwrap_or_default();
            (path, file_percentage(f.metrics.as_ref()))
        })
        .collect();

    build_snapshot(
        entries,
        file_percentage(project.metrics.as_ref()),
        parse_timestamp(project.timestamp.as_deref()),
    )
}
