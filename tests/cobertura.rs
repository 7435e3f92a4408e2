mod common;

use covdiff::detect::{detect_format, Format};
use covdiff::xml::{parse_tree, LIST_PATHS};

#[test]
fn parse_matches_stored_snapshot() {
    let snapshot = common::load_fixture("cobertura.xml");
    assert_eq!(snapshot, common::expected_snapshot("cobertura-parsed.json"));
}

#[test]
fn detects_cobertura() {
    let xml = std::fs::read(common::fixture_path("cobertura.xml")).unwrap();
    let tree = parse_tree(&xml, LIST_PATHS).unwrap();
    assert_eq!(detect_format(&tree), Some(Format::Cobertura));
}

#[test]
fn relative_filenames_without_sources_stay_relative() {
    let xml = br#"<coverage line-rate="0.5" timestamp="1">
  <packages>
    <package name="a">
      <classes>
        <class filename="pkg/a.go" line-rate="1"/>
        <class filename="pkg/sub/b.go" line-rate="0"/>
      </classes>
    </package>
  </packages>
</coverage>"#;
    let (_, snapshot) = covdiff::ingest::parse_document(xml).unwrap().unwrap();
    assert_eq!(snapshot.base_path, "pkg");
    assert_eq!(snapshot.file_by_relative("a.go").unwrap().absolute, "pkg/a.go");
    assert_eq!(snapshot.file_by_relative("sub/b.go").unwrap().coverage, 0.0);
}

#[test]
fn duplicate_relative_paths_keep_the_last() {
    // Inner classes share their outer class's file.
    let xml = br#"<coverage line-rate="0.5" timestamp="1">
  <sources><source>/src</source></sources>
  <packages>
    <package name="a">
      <classes>
        <class name="A" filename="a/A.java" line-rate="0.25"/>
        <class name="A$Inner" filename="a/A.java" line-rate="0.75"/>
        <class name="B" filename="a/B.java" line-rate="1"/>
      </classes>
    </package>
  </packages>
</coverage>"#;
    let (_, snapshot) = covdiff::ingest::parse_document(xml).unwrap().unwrap();
    assert_eq!(snapshot.files.len(), 2);
    assert_eq!(snapshot.file_by_relative("A.java").unwrap().coverage, 75.0);
}
