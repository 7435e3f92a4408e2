#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(source) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(template) = covdiff::template::Template::compile(source) {
        let context = serde_json::json!({
            "coverage": [{ "package": "a.rs", "base_coverage": "🟢 80%" }],
            "overall_coverage": { "package": "Overall Coverage" },
        });
        let _ = template.render(&context);
    }
});
