//! Uniform in-memory representation of coverage data, independent of any
//! specific format. Parsers produce a `CoverageSnapshot` which is then diffed
//! against an optional base snapshot and rendered.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Content hash of a file's relative path.
pub type FileId = String;

/// Coverage for a single source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageFile {
    /// Path with the snapshot's base path stripped.
    pub relative: String,
    /// Path as it appears in the report.
    pub absolute: String,
    /// Rounded percentage in `[0, 100]`.
    pub coverage: f64,
}

/// The complete result of parsing a single coverage report.
///
/// Snapshots are never mutated after parsing; everything downstream borrows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageSnapshot {
    pub files: BTreeMap<FileId, CoverageFile>,
    pub coverage: f64,
    pub timestamp: i64,
    pub base_path: String,
}

impl CoverageSnapshot {
    /// Look up a file by its relative path.
    #[must_use]
    pub fn file_by_relative(&self, relative: &str) -> Option<&CoverageFile> {
        self.files.get(&crate::util::create_identifier(relative))
    }
}
