#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Tree building, detection and both schema parsers must not panic.
    let _ = covdiff::ingest::parse_document(data);
});
