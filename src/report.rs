//! Report assembly: turn a coverage diff into template rows and Markdown.

use std::borrow::Cow;
use std::path::Path;

use serde::Serialize;
use tracing::debug;

use crate::config::Config;
use crate::diff::{Comparison, CoverageDiff, FileDelta};
use crate::error::{CovdiffError, Result};
use crate::template::Template;
use crate::threshold::{colorize, colorize_difference};
use crate::util::{file_exists, format_percentage};

/// Built-in template used when a base snapshot is available.
pub const WITH_BASE_TEMPLATE: &str = include_str!("../templates/with-base-coverage.md");
/// Built-in template used for a head-only report.
pub const WITHOUT_BASE_TEMPLATE: &str = include_str!("../templates/without-base-coverage.md");

pub const OVERALL_LABEL: &str = "Overall Coverage";

const BADGE_BASE_URL: &str = "https://img.shields.io/badge/";

/// One table row. Without a base only `package` and `base_coverage` are set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverageRow {
    pub package: String,
    pub base_coverage: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_coverage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difference: Option<String>,
}

/// Everything a report template can reference.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportContext {
    pub minimum_allowed_coverage: String,
    pub new_coverage: String,
    pub coverage: Vec<CoverageRow>,
    pub overall_coverage: CoverageRow,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coverage_badge: Option<String>,
}

fn percent(value: f64) -> String {
    format!("{}%", format_percentage(value))
}

fn file_row(delta: &FileDelta<'_>, config: &Config) -> CoverageRow {
    let max = config.file_coverage_warning_max;
    let min = Some(config.file_coverage_error_min);

    match delta.base() {
        None => CoverageRow {
            package: delta.relative().to_string(),
            base_coverage: colorize(Some(delta.head()), max, min),
            new_coverage: None,
            difference: None,
        },
        Some(base) => CoverageRow {
            package: delta.relative().to_string(),
            base_coverage: colorize(Some(base), max, min),
            new_coverage: Some(colorize(Some(delta.head()), max, min)),
            difference: Some(colorize_difference(delta.difference())),
        },
    }
}

fn is_changed(delta: &FileDelta<'_>) -> bool {
    match delta.comparison {
        Comparison::NoBase | Comparison::Added => true,
        Comparison::Compared { .. } => delta.difference().is_some_and(|d| d != 0.0),
    }
}

/// Per-file rows in relative-path order.
pub fn file_rows(diff: &CoverageDiff<'_>, config: &Config) -> Vec<CoverageRow> {
    if config.skip_package_coverage {
        return Vec::new();
    }
    diff.files
        .iter()
        .filter(|delta| !config.only_list_changed_files || is_changed(delta))
        .map(|delta| file_row(delta, config))
        .collect()
}

/// The summary row, banded against the overall fail threshold.
pub fn overall_row(diff: &CoverageDiff<'_>, config: &Config) -> CoverageRow {
    let min = Some(config.overall_coverage_fail_threshold);
    let head = diff.head.coverage;

    match diff.base {
        None => CoverageRow {
            package: OVERALL_LABEL.to_string(),
            base_coverage: colorize(Some(head), 0.0, min),
            new_coverage: None,
            difference: None,
        },
        Some(base) => CoverageRow {
            package: OVERALL_LABEL.to_string(),
            base_coverage: colorize(Some(base.coverage), 0.0, min),
            new_coverage: Some(colorize(Some(head), 0.0, min)),
            difference: Some(colorize_difference(diff.overall_difference())),
        },
    }
}

/// Shields.io colour for the head coverage.
pub fn badge_color(coverage: f64, config: &Config) -> &'static str {
    let min = config.file_coverage_error_min;
    let max = config.file_coverage_warning_max;
    if coverage < min {
        "red"
    } else if coverage > min && coverage < max {
        "orange"
    } else if coverage > max {
        "green"
    } else {
        "grey"
    }
}

pub fn badge_url(coverage: f64, config: &Config) -> String {
    let label = format!(
        "Code Coverage-{}-{}?style=for-the-badge",
        percent(coverage),
        badge_color(coverage, config)
    );
    format!("{BADGE_BASE_URL}{}", urlencoding::encode(&label))
}

/// Assemble the template context for a diff.
pub fn build_context(diff: &CoverageDiff<'_>, config: &Config) -> ReportContext {
    ReportContext {
        minimum_allowed_coverage: percent(config.overall_coverage_fail_threshold),
        new_coverage: percent(diff.head.coverage),
        coverage: file_rows(diff, config),
        overall_coverage: overall_row(diff, config),
        coverage_badge: config
            .badge
            .then(|| badge_url(diff.head.coverage, config)),
    }
}

/// Template source for this run: the configured file, or the built-in one.
///
/// A configured template that does not exist is an error rather than a
/// silent fallback.
pub fn select_template(config: &Config, with_base: bool) -> Result<Cow<'static, str>> {
    match config.template_path(with_base) {
        Some(path) => load_template(path).map(Cow::Owned),
        None if with_base => Ok(Cow::Borrowed(WITH_BASE_TEMPLATE)),
        None => Ok(Cow::Borrowed(WITHOUT_BASE_TEMPLATE)),
    }
}

fn load_template(path: &Path) -> Result<String> {
    if !file_exists(path) {
        return Err(CovdiffError::TemplateNotFound(path.to_path_buf()));
    }
    debug!(path = %path.display(), "loading report template");
    Ok(std::fs::read_to_string(path)?)
}

/// Trait for rendering report contexts.
pub trait ReportFormatter {
    fn format(&self, context: &ReportContext) -> Result<String>;
}

/// Renders a context through a compiled template.
pub struct MarkdownFormatter {
    template: Template,
}

impl MarkdownFormatter {
    pub fn new(source: &str) -> Result<Self> {
        Ok(Self {
            template: Template::compile(source)?,
        })
    }

    /// Formatter for the template this run should use.
    pub fn for_run(config: &Config, with_base: bool) -> Result<Self> {
        Self::new(&select_template(config, with_base)?)
    }
}

impl ReportFormatter for MarkdownFormatter {
    fn format(&self, context: &ReportContext) -> Result<String> {
        self.template.render_serialize(context)
    }
}

/// Build the context and render it with the run's template.
pub fn render_markdown(diff: &CoverageDiff<'_>, config: &Config) -> Result<String> {
    let context = build_context(diff, config);
    MarkdownFormatter::for_run(config, diff.has_base())?.format(&context)
}
