use std::path::Path;

use tracing::{debug, info, warn};

use crate::detect::{detect_format, is_supported_extension, Format};
use crate::error::Result;
use crate::model::CoverageSnapshot;
use crate::util::file_exists;
use crate::xml::{parse_tree, LIST_PATHS};

/// Read and parse the coverage report at `path`.
///
/// A missing file, a non-XML extension or an unrecognized schema is logged
/// and yields `Ok(None)`. I/O failures and malformed XML are errors.
pub fn parse_coverage(path: &Path) -> Result<Option<CoverageSnapshot>> {
    Ok(parse_coverage_with_format(path)?.map(|(_, snapshot)| snapshot))
}

/// Like [`parse_coverage`], also returning the detected format.
pub fn parse_coverage_with_format(path: &Path) -> Result<Option<(Format, CoverageSnapshot)>> {
    if !file_exists(path) {
        warn!(path = %path.display(), "coverage file not found");
        return Ok(None);
    }
    if !is_supported_extension(path) {
        warn!(path = %path.display(), "unsupported coverage file extension, expected .xml");
        return Ok(None);
    }

    let content = std::fs::read(path)?;
    debug!(path = %path.display(), bytes = content.len(), "read coverage file");

    let parsed = parse_document(&content)?;
    match &parsed {
        Some((format, snapshot)) => info!(
            path = %path.display(),
            %format,
            files = snapshot.files.len(),
            coverage = snapshot.coverage,
            "parsed coverage report"
        ),
        None => warn!(path = %path.display(), "unrecognized coverage format"),
    }
    Ok(parsed)
}

/// Parse an in-memory XML document, detecting its schema.
pub fn parse_document(content: &[u8]) -> Result<Option<(Format, CoverageSnapshot)>> {
    let tree = parse_tree(content, LIST_PATHS)?;
    let Some(format) = detect_format(&tree) else {
        return Ok(None);
    };
    let snapshot = format.parse(&tree)?;
    Ok(Some((format, snapshot)))
}
