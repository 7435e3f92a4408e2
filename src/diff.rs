/// Compare a head snapshot against an optional base snapshot.
///
/// Files are correlated by the hash of their relative path, so the same file
/// matches across snapshots even when reports were generated in different
/// checkouts.
use crate::model::{CoverageFile, CoverageSnapshot};
use crate::util::round_percentage;

/// How a head file relates to the base snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Comparison {
    /// No base snapshot was supplied.
    NoBase,
    /// A base snapshot exists but does not contain this file.
    Added,
    /// The file exists in both snapshots.
    Compared { base: f64 },
}

/// One head file and its change against the base.
#[derive(Debug, Clone, PartialEq)]
pub struct FileDelta<'a> {
    pub file: &'a CoverageFile,
    pub comparison: Comparison,
}

impl FileDelta<'_> {
    pub fn relative(&self) -> &str {
        &self.file.relative
    }

    pub fn head(&self) -> f64 {
        self.file.coverage
    }

    /// Base percentage as displayed: 0 for added files, `None` without a base.
    pub fn base(&self) -> Option<f64> {
        match self.comparison {
            Comparison::NoBase => None,
            Comparison::Added => Some(0.0),
            Comparison::Compared { base } => Some(base),
        }
    }

    /// Rounded head minus base, `None` without a base.
    pub fn difference(&self) -> Option<f64> {
        self.base()
            .map(|base| round_percentage(self.file.coverage - base))
    }
}

/// Result of comparing two snapshots.
#[derive(Debug, Clone, PartialEq)]
pub struct CoverageDiff<'a> {
    pub head: &'a CoverageSnapshot,
    pub base: Option<&'a CoverageSnapshot>,
    /// Head files sorted by relative path.
    pub files: Vec<FileDelta<'a>>,
}

impl CoverageDiff<'_> {
    pub fn has_base(&self) -> bool {
        self.base.is_some()
    }

    /// Rounded overall head minus base, `None` without a base.
    pub fn overall_difference(&self) -> Option<f64> {
        self.base
            .map(|base| round_percentage(self.head.coverage - base.coverage))
    }
}

/// Build the per-file comparison of `head` against `base`.
pub fn diff<'a>(
    head: &'a CoverageSnapshot,
    base: Option<&'a CoverageSnapshot>,
) -> CoverageDiff<'a> {
    let mut files: Vec<FileDelta<'a>> = head
        .files
        .iter()
        .map(|(id, file)| {
            let comparison = match base {
                None => Comparison::NoBase,
                Some(base) => match base.files.get(id) {
                    Some(b) => Comparison::Compared { base: b.coverage },
                    None => Comparison::Added,
                },
            };
            FileDelta { file, comparison }
        })
        .collect();

    files.sort_by(|a, b| a.file.relative.cmp(&b.file.relative));

    CoverageDiff { head, base, files }
}
