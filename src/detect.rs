/// Format detection for parsed coverage trees.
///
/// Detection is structural: Cobertura documents carry `coverage.packages`,
/// Clover documents carry `coverage.project`. File extensions only decide
/// whether a path is worth reading at all.
use std::path::Path;

use serde_json::Value;

use crate::error::{CovdiffError, Result};
use crate::model::CoverageSnapshot;
use crate::parsers::{clover::CloverParser, cobertura::CoberturaParser, Parser};

/// Supported coverage formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Clover,
    Cobertura,
}

impl Format {
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Clover => "clover",
            Format::Cobertura => "cobertura",
        }
    }

    /// Run this format's parser over `tree`.
    pub fn parse(&self, tree: &Value) -> Result<CoverageSnapshot> {
        match self {
            Format::Clover => CloverParser.parse(tree),
            Format::Cobertura => CoberturaParser.parse(tree),
        }
    }
}

impl std::str::FromStr for Format {
    type Err = CovdiffError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "clover" => Ok(Format::Clover),
            "cobertura" => Ok(Format::Cobertura),
            _ => Err(CovdiffError::UnknownFormat),
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Detect the schema of a parsed tree.
pub fn detect_format(tree: &Value) -> Option<Format> {
    let coverage = tree.get("coverage")?;
    if coverage.get("packages").is_some() {
        Some(Format::Cobertura)
    } else if coverage.get("project").is_some() {
        Some(Format::Clover)
    } else {
        None
    }
}

/// Only `.xml` reports are read.
pub fn is_supported_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("xml"))
}
