#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::PathBuf;

use covdiff::model::{CoverageFile, CoverageSnapshot};
use covdiff::util::create_identifier;

pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

/// Parse a fixture report through the full ingestion path.
pub fn load_fixture(name: &str) -> CoverageSnapshot {
    covdiff::ingest::parse_coverage(&fixture_path(name))
        .unwrap()
        .unwrap_or_else(|| panic!("fixture {name} was not recognized"))
}

/// The stored canonical snapshot for a fixture report.
pub fn expected_snapshot(name: &str) -> CoverageSnapshot {
    let json = std::fs::read_to_string(fixture_path(name)).unwrap();
    serde_json::from_str(&json).unwrap()
}

/// Build a snapshot by hand from `(relative path, percentage)` pairs.
pub fn snapshot(files: &[(&str, f64)], coverage: f64) -> CoverageSnapshot {
    let files: BTreeMap<_, _> = files
        .iter()
        .map(|(relative, pct)| {
            (
                create_identifier(relative),
                CoverageFile {
                    relative: relative.to_string(),
                    absolute: format!("/repo/{relative}"),
                    coverage: *pct,
                },
            )
        })
        .collect();
    CoverageSnapshot {
        files,
        coverage,
        timestamp: 0,
        base_path: "/repo".to_string(),
    }
}

/// Replace one file's percentage, keyed by relative path.
pub fn with_file_coverage(
    mut snapshot: CoverageSnapshot,
    relative: &str,
    pct: f64,
) -> CoverageSnapshot {
    let file = snapshot
        .files
        .get_mut(&create_identifier(relative))
        .unwrap_or_else(|| panic!("{relative} not in snapshot"));
    file.coverage = pct;
    snapshot
}
