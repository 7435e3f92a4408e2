#![no_main]
use libfuzzer_sys::fuzz_target;

use covdiff::util::{determine_common_base_path, SEPARATOR};

fuzz_target!(|data: &[u8]| {
    let Ok(s) = std::str::from_utf8(data) else {
        return;
    };
    let files: Vec<&str> = s.lines().collect();
    let base = determine_common_base_path(&files, SEPARATOR);
    if !files.is_empty() {
        for f in &files {
            assert!(f.starts_with(&base), "{base:?} is not a prefix of {f:?}");
        }
    }
});
