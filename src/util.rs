//! Percentage, hashing and path helpers shared by the parsers and the diff
//! engine.

use std::path::Path;

use sha2::{Digest, Sha256};

/// Separator used when splitting report paths.
pub const SEPARATOR: &str = "/";

/// Round a percentage to two decimal places.
///
/// The epsilon nudge keeps values like `1.005` from rounding down because of
/// their binary representation.
#[must_use]
pub fn round_percentage(percentage: f64) -> f64 {
    ((percentage + f64::EPSILON) * 100.0).round() / 100.0
}

/// Render a percentage the way it is shown in reports: `70`, `50.51`, `-1.5`.
#[must_use]
pub fn format_percentage(percentage: f64) -> String {
    // `-0.0 + 0.0` is `+0.0`
    format!("{}", percentage + 0.0)
}

/// Hex-encoded SHA-256 of `data`, used to correlate files across snapshots.
#[must_use]
pub fn create_identifier(data: impl AsRef<[u8]>) -> String {
    hex::encode(Sha256::digest(data.as_ref()))
}

/// Escape every regex metacharacter so `s` matches literally.
#[must_use]
pub fn escape_regex(s: &str) -> String {
    regex::escape(s)
}

/// Whether `path` exists on disk.
#[must_use]
pub fn file_exists(path: &Path) -> bool {
    path.exists()
}

/// Longest run of leading path segments shared by every entry in `files`.
///
/// This is pure segment matching: a single path yields itself, and an empty
/// list yields an empty string.
#[must_use]
pub fn determine_common_base_path<S: AsRef<str>>(files: &[S], separator: &str) -> String {
    let Some((first, rest)) = files.split_first() else {
        return String::new();
    };

    let rest: Vec<Vec<&str>> = rest
        .iter()
        .map(|f| f.as_ref().split(separator).collect())
        .collect();

    first
        .as_ref()
        .split(separator)
        .enumerate()
        .take_while(|(i, segment)| rest.iter().all(|other| other.get(*i) == Some(segment)))
        .map(|(_, segment)| segment)
        .collect::<Vec<_>>()
        .join(separator)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_percentage() {
        assert_eq!(round_percentage(45.51234565), 45.51);
        assert_eq!(round_percentage(45.51634565), 45.52);
        assert_eq!(round_percentage(50.0 / 99.0 * 100.0), 50.51);
        assert_eq!(round_percentage(-1.509999999999998), -1.51);
    }

    #[test]
    fn test_round_percentage_idempotent() {
        for x in [0.0, 1.005, 33.333333, 45.51234565, 66.665, 99.999, -8.125, 100.0] {
            let once = round_percentage(x);
            assert_eq!(round_percentage(once), once, "not idempotent for {x}");
        }
    }

    #[test]
    fn test_format_percentage() {
        assert_eq!(format_percentage(70.0), "70");
        assert_eq!(format_percentage(50.51), "50.51");
        assert_eq!(format_percentage(-1.5), "-1.5");
        assert_eq!(format_percentage(-0.0), "0");
    }

    #[test]
    fn test_create_identifier() {
        let id = create_identifier("foo");
        assert_eq!(
            id,
            "2c26b46b68ffc68ff99b453c1d30413413422d706483bfa0f98a5e886266e7ae"
        );
        assert_eq!(create_identifier("foo"), create_identifier(b"foo"));
        assert_ne!(create_identifier("foo"), create_identifier("bar"));
    }

    #[test]
    fn test_escape_regex() {
        let output = escape_regex("\\^$.|?*+{}[]()");
        assert_eq!(output, "\\\\\\^\\$\\.\\|\\?\\*\\+\\{\\}\\[\\]\\(\\)");

        let re = regex::Regex::new(&format!("^{}", escape_regex("/src/a+b (1)/"))).unwrap();
        assert!(re.is_match("/src/a+b (1)/x.rs"));
        assert!(!re.is_match("/src/aab 1/x.rs"));
    }

    #[test]
    fn test_determine_common_base_path() {
        let path = determine_common_base_path(
            &["/usr/src/app/foo.js", "/usr/src/app/foo/bar.js"],
            SEPARATOR,
        );
        assert_eq!(path, "/usr/src/app");
    }

    #[test]
    fn test_determine_common_base_path_empty() {
        let files: [&str; 0] = [];
        assert_eq!(determine_common_base_path(&files, SEPARATOR), "");
    }

    #[test]
    fn test_determine_common_base_path_single() {
        assert_eq!(
            determine_common_base_path(&["/usr/src/app/foo.js"], SEPARATOR),
            "/usr/src/app/foo.js"
        );
    }

    #[test]
    fn test_determine_common_base_path_stops_at_first_mismatch() {
        // Segment 3 matches again after a mismatch but is not part of the prefix.
        let path = determine_common_base_path(&["/a/x/same/f.rs", "/a/y/same/g.rs"], SEPARATOR);
        assert_eq!(path, "/a");
    }

    #[test]
    fn test_determine_common_base_path_is_prefix_of_every_input() {
        let files = [
            "/home/runner/work/app/src/Kernel.php",
            "/home/runner/work/app/src/Controller/HomeController.php",
            "/home/runner/work/app/tests/KernelTest.php",
        ];
        let base = determine_common_base_path(&files, SEPARATOR);
        assert_eq!(base, "/home/runner/work/app");
        for f in files {
            assert!(f.starts_with(&base));
        }
    }

    #[test]
    fn test_determine_common_base_path_nothing_shared() {
        assert_eq!(determine_common_base_path(&["a/x.rs", "b/y.rs"], SEPARATOR), "");
    }

    #[test]
    fn test_file_exists() {
        assert!(file_exists(&Path::new(env!("CARGO_MANIFEST_DIR")).join("Cargo.toml")));
        assert!(!file_exists(Path::new("definitely/not/here.xml")));
    }
}
