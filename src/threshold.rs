//! Classify percentages into colour bands for display.

use crate::util::format_percentage;

/// Display band of a percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    Pass,
    Warn,
    Fail,
    Unknown,
}

impl Band {
    pub fn symbol(&self) -> &'static str {
        match self {
            Band::Pass => "🟢",
            Band::Warn => "🟠",
            Band::Fail => "🔴",
            Band::Unknown => "⚪",
        }
    }
}

/// Classify `value` against `max` and an optional `min`.
///
/// With only `max`, a value exactly equal to it is `Unknown`. With both bounds
/// the middle band `[min, max]` is inclusive.
pub fn classify(value: f64, max: f64, min: Option<f64>) -> Band {
    match min {
        None => {
            if value > max {
                Band::Pass
            } else if value < max {
                Band::Fail
            } else {
                Band::Unknown
            }
        }
        Some(min) => {
            if value < min {
                Band::Fail
            } else if value >= min && value <= max {
                Band::Warn
            } else if value > max {
                Band::Pass
            } else {
                Band::Unknown
            }
        }
    }
}

/// Render `<symbol> <pct>%`. A missing value renders as `⚪ 0%`.
pub fn colorize(value: Option<f64>, max: f64, min: Option<f64>) -> String {
    match value {
        None => format!("{} 0%", Band::Unknown.symbol()),
        Some(value) => format!(
            "{} {}%",
            classify(value, max, min).symbol(),
            format_percentage(value)
        ),
    }
}

/// [`colorize`] with the default bands: positive passes, negative fails.
pub fn colorize_difference(value: Option<f64>) -> String {
    colorize(value, 0.0, None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_colorize_table() {
        assert_eq!(colorize(None, 0.0, None), "⚪ 0%");
        assert_eq!(colorize(Some(0.0), 0.0, None), "⚪ 0%");
        assert_eq!(colorize(Some(20.0), 50.0, None), "🔴 20%");
        assert_eq!(colorize(Some(70.0), 50.0, None), "🟢 70%");
        assert_eq!(colorize(Some(20.0), 75.0, Some(30.0)), "🔴 20%");
        assert_eq!(colorize(Some(40.0), 75.0, Some(30.0)), "🟠 40%");
        assert_eq!(colorize(Some(80.0), 75.0, Some(30.0)), "🟢 80%");
    }

    #[test]
    fn test_band_boundaries() {
        assert_eq!(classify(75.0, 75.0, None), Band::Unknown);
        assert_eq!(classify(75.0, 75.0, Some(50.0)), Band::Warn);
        assert_eq!(classify(50.0, 75.0, Some(50.0)), Band::Warn);
        assert_eq!(classify(49.99, 75.0, Some(50.0)), Band::Fail);
        assert_eq!(classify(75.01, 75.0, Some(50.0)), Band::Pass);
    }

    #[test]
    fn test_band_degenerate() {
        assert_eq!(classify(f64::NAN, 75.0, Some(50.0)), Band::Unknown);
        assert_eq!(classify(f64::NAN, 0.0, None), Band::Unknown);
        // Inverted bounds never produce Warn.
        assert_eq!(classify(60.0, 50.0, Some(70.0)), Band::Fail);
        assert_eq!(classify(60.0, 50.0, Some(55.0)), Band::Pass);
    }

    #[test]
    fn test_colorize_difference() {
        assert_eq!(colorize_difference(Some(-8.5)), "🔴 -8.5%");
        assert_eq!(colorize_difference(Some(1.25)), "🟢 1.25%");
        assert_eq!(colorize_difference(Some(-0.0)), "⚪ 0%");
    }
}
