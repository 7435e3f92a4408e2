mod common;

use std::io::Write;

use covdiff::detect::Format;
use covdiff::error::CovdiffError;
use covdiff::ingest::{parse_coverage, parse_coverage_with_format, parse_document};

#[test]
fn ingest_both_formats() {
    let (format, clover) = parse_coverage_with_format(&common::fixture_path("clover.xml"))
        .unwrap()
        .unwrap();
    assert_eq!(format, Format::Clover);
    assert_eq!(clover.files.len(), 4);

    let (format, cobertura) = parse_coverage_with_format(&common::fixture_path("cobertura.xml"))
        .unwrap()
        .unwrap();
    assert_eq!(format, Format::Cobertura);
    assert_eq!(cobertura.coverage, 80.55);
}

#[test]
fn missing_file_is_none() {
    assert!(parse_coverage(&common::fixture_path("nope.xml")).unwrap().is_none());
}

#[test]
fn unknown_schema_is_none() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("jacoco.xml");
    let mut file = std::fs::File::create(&path).unwrap();
    let xml = br#"<?xml version="1.0"?><report name="x"><counter type="LINE" missed="1" covered="2"/></report>"#;
    file.write_all(xml).unwrap();
    assert!(parse_coverage(&path).unwrap().is_none());
}

#[test]
fn non_xml_extension_is_none() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("coverage.json");
    std::fs::copy(common::fixture_path("clover.xml"), &path).unwrap();
    assert!(parse_coverage(&path).unwrap().is_none());
}

#[test]
fn uppercase_extension_is_read() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("COVERAGE.XML");
    std::fs::copy(common::fixture_path("cobertura.xml"), &path).unwrap();
    assert!(parse_coverage(&path).unwrap().is_some());
}

#[test]
fn truncated_xml_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("coverage.xml");
    std::fs::write(&path, "<coverage><project><file name=\"a\"></project>").unwrap();
    let err = parse_coverage(&path).unwrap_err();
    assert!(err.to_string().contains("position"));
}

#[test]
fn deeply_nested_document_is_an_error() {
    let mut xml = String::from("<coverage><project>");
    xml.push_str(&"<a>".repeat(20_000));
    xml.push_str(&"</a>".repeat(20_000));
    xml.push_str("</project></coverage>");

    let err = parse_document(xml.as_bytes()).unwrap_err();
    assert!(matches!(err, CovdiffError::XmlDepth { .. }));
}
