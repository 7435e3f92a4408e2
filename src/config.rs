//! Resolved run configuration.
//!
//! A `Config` is built once at the boundary (see `cli::Inputs`) and passed by
//! reference to everything that needs it.

use std::path::{Path, PathBuf};

use crate::error::{CovdiffError, Result};

/// Placeholder replaced by the branch or ref name in artifact names.
pub const ARTIFACT_NAME_PLACEHOLDER: &str = "%name%";

/// Which axis the negative-difference gate checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NegativeDifferenceBy {
    Overall,
    #[default]
    Package,
}

impl NegativeDifferenceBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            NegativeDifferenceBy::Overall => "overall",
            NegativeDifferenceBy::Package => "package",
        }
    }

    /// `overall` selects the overall axis; anything else means per file.
    pub fn from_input(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("overall") {
            NegativeDifferenceBy::Overall
        } else {
            NegativeDifferenceBy::Package
        }
    }
}

impl std::fmt::Display for NegativeDifferenceBy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Head coverage report.
    pub filename: PathBuf,
    pub badge: bool,
    pub overall_coverage_fail_threshold: f64,
    pub file_coverage_error_min: f64,
    pub file_coverage_warning_max: f64,
    pub fail_on_negative_difference: bool,
    pub negative_difference_by: NegativeDifferenceBy,
    /// Always zero or negative.
    pub negative_difference_threshold: f64,
    pub markdown_filename: String,
    pub artifact_name: String,
    pub retention_days: Option<u32>,
    pub with_base_coverage_template: Option<PathBuf>,
    pub without_base_coverage_template: Option<PathBuf>,
    pub only_list_changed_files: bool,
    pub skip_package_coverage: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            filename: PathBuf::from("coverage.xml"),
            badge: false,
            overall_coverage_fail_threshold: 0.0,
            file_coverage_error_min: 50.0,
            file_coverage_warning_max: 75.0,
            fail_on_negative_difference: false,
            negative_difference_by: NegativeDifferenceBy::default(),
            negative_difference_threshold: 0.0,
            markdown_filename: "code-coverage-results".to_string(),
            artifact_name: "coverage-%name%".to_string(),
            retention_days: None,
            with_base_coverage_template: None,
            without_base_coverage_template: None,
            only_list_changed_files: false,
            skip_package_coverage: false,
        }
    }
}

impl Config {
    /// Reject configurations that would make later stages misbehave.
    pub fn validate(&self) -> Result<()> {
        if !self.artifact_name.contains(ARTIFACT_NAME_PLACEHOLDER) {
            return Err(CovdiffError::Config(format!(
                "artifact_name is missing {ARTIFACT_NAME_PLACEHOLDER} variable"
            )));
        }
        for (name, value) in [
            ("overall_coverage_fail_threshold", self.overall_coverage_fail_threshold),
            ("file_coverage_error_min", self.file_coverage_error_min),
            ("file_coverage_warning_max", self.file_coverage_warning_max),
            ("negative_difference_threshold", self.negative_difference_threshold),
        ] {
            if !value.is_finite() {
                return Err(CovdiffError::Config(format!("{name} must be a number")));
            }
        }
        if self.negative_difference_threshold > 0.0 {
            return Err(CovdiffError::Config(
                "negative_difference_threshold must not be positive".to_string(),
            ));
        }
        if self.markdown_filename.trim().is_empty() {
            return Err(CovdiffError::Config(
                "markdown_filename must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Artifact name for `name`, with `/` replaced so refs like
    /// `feature/x` stay a single path segment.
    pub fn format_artifact_name(&self, name: &str) -> String {
        self.artifact_name
            .replace(ARTIFACT_NAME_PLACEHOLDER, name)
            .replace('/', "-")
    }

    /// Template for the current run, if one was configured.
    pub fn template_path(&self, with_base: bool) -> Option<&Path> {
        if with_base {
            self.with_base_coverage_template.as_deref()
        } else {
            self.without_base_coverage_template.as_deref()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.file_coverage_error_min, 50.0);
        assert_eq!(config.file_coverage_warning_max, 75.0);
        assert_eq!(config.negative_difference_by, NegativeDifferenceBy::Package);
    }

    #[test]
    fn test_artifact_name_requires_placeholder() {
        let config = Config {
            artifact_name: "coverage".to_string(),
            ..Config::default()
        };
        let err = config.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid configuration: artifact_name is missing %name% variable"
        );
    }

    #[test]
    fn test_non_finite_threshold_rejected() {
        let config = Config {
            overall_coverage_fail_threshold: f64::NAN,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_positive_negative_threshold_rejected() {
        let config = Config {
            negative_difference_threshold: 1.0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_format_artifact_name() {
        let config = Config::default();
        assert_eq!(config.format_artifact_name("main"), "coverage-main");
        assert_eq!(
            config.format_artifact_name("feature/new-parser"),
            "coverage-feature-new-parser"
        );
    }

    #[test]
    fn test_negative_difference_by_from_input() {
        assert_eq!(NegativeDifferenceBy::from_input("overall"), NegativeDifferenceBy::Overall);
        assert_eq!(NegativeDifferenceBy::from_input("OVERALL "), NegativeDifferenceBy::Overall);
        assert_eq!(NegativeDifferenceBy::from_input("package"), NegativeDifferenceBy::Package);
        assert_eq!(NegativeDifferenceBy::from_input("anything"), NegativeDifferenceBy::Package);
    }

    #[test]
    fn test_template_path() {
        let config = Config {
            with_base_coverage_template: Some(PathBuf::from("with.md")),
            ..Config::default()
        };
        assert_eq!(config.template_path(true), Some(Path::new("with.md")));
        assert_eq!(config.template_path(false), None);
    }
}
