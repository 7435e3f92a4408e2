//! Pass/fail evaluation of a coverage diff.
//!
//! Failures are soft: every violated rule is collected so the report can list
//! them all before the process exits non-zero.

use std::fmt;

use tracing::{debug, warn};

use crate::config::{Config, NegativeDifferenceBy};
use crate::diff::CoverageDiff;
use crate::util::format_percentage;

#[derive(Debug, Clone, PartialEq)]
pub enum GateFailure {
    /// Head coverage is below the configured overall minimum.
    BelowThreshold { coverage: f64, threshold: f64 },
    /// Overall coverage dropped further than allowed.
    OverallDropped { difference: f64, base: f64, head: f64 },
    /// A single file's coverage dropped further than allowed.
    FileDropped { relative: String, difference: f64 },
}

impl fmt::Display for GateFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GateFailure::BelowThreshold {
                coverage,
                threshold,
            } => write!(
                f,
                "FAIL: Overall coverage of {}% below minimum threshold of {}%.",
                format_percentage(*coverage),
                format_percentage(*threshold)
            ),
            GateFailure::OverallDropped {
                difference,
                base,
                head,
            } => write!(
                f,
                "FAIL: Overall coverage changed by {}%, from {}% to {}%.",
                format_percentage(*difference),
                format_percentage(*base),
                format_percentage(*head)
            ),
            GateFailure::FileDropped {
                relative,
                difference,
            } => write!(
                f,
                "FAIL: {} coverage difference was {}%",
                relative,
                format_percentage(*difference)
            ),
        }
    }
}

fn is_dropped(difference: f64, threshold: f64) -> bool {
    difference < 0.0 && difference < threshold
}

/// Collect every rule the diff violates under `config`.
pub fn evaluate(diff: &CoverageDiff<'_>, config: &Config) -> Vec<GateFailure> {
    let mut failures = Vec::new();

    if diff.head.coverage < config.overall_coverage_fail_threshold {
        failures.push(GateFailure::BelowThreshold {
            coverage: diff.head.coverage,
            threshold: config.overall_coverage_fail_threshold,
        });
    }

    if config.fail_on_negative_difference {
        let threshold = config.negative_difference_threshold;
        debug!(by = %config.negative_difference_by, threshold, "checking negative difference");

        match config.negative_difference_by {
            NegativeDifferenceBy::Overall => {
                if let (Some(base), Some(difference)) = (diff.base, diff.overall_difference()) {
                    if is_dropped(difference, threshold) {
                        failures.push(GateFailure::OverallDropped {
                            difference,
                            base: base.coverage,
                            head: diff.head.coverage,
                        });
                    }
                }
            }
            NegativeDifferenceBy::Package => {
                failures.extend(diff.files.iter().filter_map(|delta| {
                    let difference = delta.difference()?;
                    is_dropped(difference, threshold).then(|| GateFailure::FileDropped {
                        relative: delta.relative().to_string(),
                        difference,
                    })
                }));
            }
        }
    }

    for failure in &failures {
        warn!("{failure}");
    }
    failures
}
