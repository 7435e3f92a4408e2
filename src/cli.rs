//! Command handler functions for the covdiff CLI.
//!
//! Each `cmd_*` function returns its output as a value or `String`, making
//! them easy to test without capturing stdout.

use std::fmt::Write as _;
use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use clap::builder::FalseyValueParser;
use clap::{ArgAction, Args};
use tracing::{debug, info, warn};

use crate::config::{Config, NegativeDifferenceBy};
use crate::diff::diff;
use crate::gate::{self, GateFailure};
use crate::ingest::{parse_coverage, parse_coverage_with_format};
use crate::model::CoverageSnapshot;
use crate::report;
use crate::util::format_percentage;

/// Run options. Every option can also be supplied the way GitHub Actions
/// passes action inputs, as an `INPUT_<NAME>` environment variable.
#[derive(Args, Debug, Clone)]
pub struct Inputs {
    /// Head coverage report (Clover or Cobertura XML).
    #[arg(long, env = "INPUT_FILENAME", default_value = "coverage.xml")]
    pub filename: PathBuf,

    /// Add a shields.io coverage badge to the report.
    #[arg(
        long,
        env = "INPUT_BADGE",
        action = ArgAction::SetTrue,
        value_parser = FalseyValueParser::new()
    )]
    pub badge: bool,

    /// Fail when overall coverage is below this percentage.
    #[arg(
        long,
        env = "INPUT_OVERALL_COVERAGE_FAIL_THRESHOLD",
        default_value_t = 0.0,
        allow_negative_numbers = true
    )]
    pub overall_coverage_fail_threshold: f64,

    /// Files below this percentage are shown red.
    #[arg(
        long,
        env = "INPUT_FILE_COVERAGE_ERROR_MIN",
        default_value_t = 50.0,
        allow_negative_numbers = true
    )]
    pub file_coverage_error_min: f64,

    /// Files above this percentage are shown green.
    #[arg(
        long,
        env = "INPUT_FILE_COVERAGE_WARNING_MAX",
        default_value_t = 75.0,
        allow_negative_numbers = true
    )]
    pub file_coverage_warning_max: f64,

    /// Fail when coverage dropped compared to the base report.
    #[arg(
        long,
        env = "INPUT_FAIL_ON_NEGATIVE_DIFFERENCE",
        action = ArgAction::SetTrue,
        value_parser = FalseyValueParser::new()
    )]
    pub fail_on_negative_difference: bool,

    /// `overall` or `package`.
    #[arg(long, env = "INPUT_NEGATIVE_DIFFERENCE_BY", default_value = "package")]
    pub negative_difference_by: String,

    /// Allowed drop in percentage points before failing.
    #[arg(
        long,
        env = "INPUT_NEGATIVE_DIFFERENCE_THRESHOLD",
        default_value_t = 0.0,
        allow_negative_numbers = true
    )]
    pub negative_difference_threshold: f64,

    /// Name of the Markdown file to write, without extension.
    #[arg(long, env = "INPUT_MARKDOWN_FILENAME", default_value = "code-coverage-results")]
    pub markdown_filename: String,

    /// Artifact name pattern; must contain `%name%`.
    #[arg(long, env = "INPUT_ARTIFACT_NAME", default_value = "coverage-%name%")]
    pub artifact_name: String,

    /// Artifact retention in days.
    #[arg(long, env = "INPUT_RETENTION_DAYS")]
    pub retention_days: Option<u32>,

    /// Template used when a base report is available.
    #[arg(long, env = "INPUT_WITH_BASE_COVERAGE_TEMPLATE")]
    pub with_base_coverage_template: Option<PathBuf>,

    /// Template used for a head-only report.
    #[arg(long, env = "INPUT_WITHOUT_BASE_COVERAGE_TEMPLATE")]
    pub without_base_coverage_template: Option<PathBuf>,

    /// Only list files whose coverage changed.
    #[arg(
        long,
        env = "INPUT_ONLY_LIST_CHANGED_FILES",
        action = ArgAction::SetTrue,
        value_parser = FalseyValueParser::new()
    )]
    pub only_list_changed_files: bool,

    /// Leave per-file rows out of the report.
    #[arg(
        long,
        env = "INPUT_SKIP_PACKAGE_COVERAGE",
        action = ArgAction::SetTrue,
        value_parser = FalseyValueParser::new()
    )]
    pub skip_package_coverage: bool,
}

impl Inputs {
    /// Normalize raw inputs into a validated [`Config`].
    pub fn into_config(self) -> crate::error::Result<Config> {
        let config = Config {
            filename: self.filename,
            badge: self.badge,
            overall_coverage_fail_threshold: self.overall_coverage_fail_threshold.abs(),
            file_coverage_error_min: self.file_coverage_error_min.abs(),
            file_coverage_warning_max: self.file_coverage_warning_max.abs(),
            fail_on_negative_difference: self.fail_on_negative_difference,
            negative_difference_by: NegativeDifferenceBy::from_input(&self.negative_difference_by),
            negative_difference_threshold: -self.negative_difference_threshold.abs(),
            markdown_filename: self.markdown_filename,
            artifact_name: self.artifact_name,
            retention_days: self.retention_days,
            with_base_coverage_template: self.with_base_coverage_template,
            without_base_coverage_template: self.without_base_coverage_template,
            only_list_changed_files: self.only_list_changed_files,
            skip_package_coverage: self.skip_package_coverage,
        };
        config.validate()?;
        Ok(config)
    }
}

/// Result of a `report` run.
#[derive(Debug)]
pub struct ReportOutcome {
    pub markdown: String,
    /// Overall head coverage.
    pub coverage: f64,
    pub failures: Vec<GateFailure>,
}

/// Files GitHub Actions reads results from, when running inside a workflow.
#[derive(Debug, Default, Clone)]
pub struct GithubFiles {
    pub step_summary: Option<PathBuf>,
    pub output: Option<PathBuf>,
}

impl GithubFiles {
    pub fn from_env() -> Self {
        let path = |name: &str| {
            std::env::var_os(name)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
        };
        Self {
            step_summary: path("GITHUB_STEP_SUMMARY"),
            output: path("GITHUB_OUTPUT"),
        }
    }
}

fn load_base(path: &Path) -> Option<CoverageSnapshot> {
    match parse_coverage(path) {
        Ok(Some(snapshot)) => Some(snapshot),
        Ok(None) => {
            warn!(path = %path.display(), "no base coverage found, reporting without a diff");
            None
        }
        Err(e) => {
            warn!(
                path = %path.display(),
                error = %e,
                "failed to parse base coverage, reporting without a diff"
            );
            None
        }
    }
}

/// Parse, compare, gate and render. Nothing is written to disk.
pub fn cmd_report(config: &Config, base: Option<&Path>) -> Result<ReportOutcome> {
    let head = parse_coverage(&config.filename)
        .with_context(|| format!("Failed to parse {}", config.filename.display()))?
        .ok_or_else(|| anyhow!("No coverage found in {}", config.filename.display()))?;
    let base = base.and_then(load_base);

    let diff = diff(&head, base.as_ref());
    debug!(head = head.coverage, "head coverage");
    debug!(base = ?base.as_ref().map(|b| b.coverage), "base coverage");
    debug!(difference = ?diff.overall_difference(), "overall difference");

    let failures = gate::evaluate(&diff, config);
    let markdown = report::render_markdown(&diff, config).context("Failed to render report")?;

    Ok(ReportOutcome {
        markdown,
        coverage: head.coverage,
        failures,
    })
}

/// Write `<markdown_filename>.md` into `dir` and publish results to GitHub
/// Actions files when present. Returns the Markdown path.
pub fn write_outputs(
    config: &Config,
    outcome: &ReportOutcome,
    dir: &Path,
    github: &GithubFiles,
) -> Result<PathBuf> {
    let file_name = format!("{}.md", config.markdown_filename);
    let path = dir.join(&file_name);
    info!(path = %path.display(), "writing results");
    std::fs::write(&path, &outcome.markdown)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    if let Some(summary) = &github.step_summary {
        info!("writing job summary");
        append(summary, &outcome.markdown)?;
    }
    if let Some(output) = &github.output {
        let lines = format!(
            "file={}\ncoverage={}\n",
            file_name,
            format_percentage(outcome.coverage)
        );
        append(output, &lines)?;
    }

    Ok(path)
}

fn append(path: &Path, content: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    file.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write {}", path.display()))
}

/// Canonical snapshot of `file` as pretty JSON.
pub fn cmd_parse(file: &Path) -> Result<String> {
    let snapshot = parse_coverage(file)
        .with_context(|| format!("Failed to parse {}", file.display()))?
        .ok_or_else(|| anyhow!("No coverage found in {}", file.display()))?;
    let mut out = serde_json::to_string_pretty(&snapshot)?;
    out.push('\n');
    Ok(out)
}

/// Reports carry epoch seconds or, for some generators, milliseconds.
fn generated_at(timestamp: i64) -> Option<DateTime<Utc>> {
    if timestamp <= 0 {
        return None;
    }
    if timestamp > 100_000_000_000 {
        DateTime::<Utc>::from_timestamp_millis(timestamp)
    } else {
        DateTime::<Utc>::from_timestamp(timestamp, 0)
    }
}

pub fn cmd_summary(file: &Path) -> Result<String> {
    let (format, snapshot) = parse_coverage_with_format(file)
        .with_context(|| format!("Failed to parse {}", file.display()))?
        .ok_or_else(|| anyhow!("No coverage found in {}", file.display()))?;

    let mut files: Vec<_> = snapshot.files.values().collect();
    files.sort_by(|a, b| a.relative.cmp(&b.relative));

    let mut out = String::new();
    writeln!(out, "Format:     {}", format).unwrap();
    writeln!(out, "Base path:  {}", snapshot.base_path).unwrap();
    match generated_at(snapshot.timestamp) {
        Some(at) => writeln!(out, "Generated:  {}", at.format("%Y-%m-%d %H:%M:%S UTC")).unwrap(),
        None => writeln!(out, "Generated:  unknown").unwrap(),
    }
    writeln!(out, "Files:      {}", files.len()).unwrap();
    writeln!(out, "Coverage:   {}%", format_percentage(snapshot.coverage)).unwrap();

    if !files.is_empty() {
        out.push('\n');
        writeln!(out, "{:<60} {:>8}", "FILE", "COVERAGE").unwrap();
        writeln!(out, "{}", "-".repeat(69)).unwrap();
        for f in files {
            writeln!(out, "{:<60} {:>7}%", f.relative, format_percentage(f.coverage)).unwrap();
        }
    }
    Ok(out)
}

pub fn cmd_artifact_name(config: &Config, name: &str) -> String {
    let mut out = String::new();
    writeln!(out, "{}", config.format_artifact_name(name)).unwrap();
    if let Some(days) = config.retention_days {
        writeln!(out, "retention-days: {days}").unwrap();
    }
    out
}
