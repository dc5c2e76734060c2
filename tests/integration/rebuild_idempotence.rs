//! Integration tests for rebuild idempotence

use crate::integration::Fixture;
use graft::tree::LinkMode;

#[test]
fn test_second_rebuild_without_changes_is_noop() {
    let fixture = Fixture::new();
    fixture.write_upstream("out.js", "u");
    fixture.write_upstream("assets/app.js", "app");
    fixture.write_appended("A/x.js", "x");
    fixture.write_appended("lazy/chunk.js", "chunk");
    let mut rebuilder = fixture.rebuilder(&[("A", "out.js")], &[("lazy", "assets")], LinkMode::Auto);

    let first = rebuilder.rebuild().unwrap();
    assert!(!first.is_noop());

    let second = rebuilder.rebuild().unwrap();
    assert!(second.is_noop(), "second rebuild did work: {:?}", second);
    assert_eq!(fixture.read_output("out.js"), "u;\nx");
}

#[test]
fn test_empty_inputs_produce_empty_output() {
    let fixture = Fixture::new();
    let mut rebuilder = fixture.rebuilder(&[("A", "out.js")], &[], LinkMode::Auto);

    let report = rebuilder.rebuild().unwrap();
    assert!(report.is_noop());
    assert!(fixture.roots.output.is_dir());
    assert!(rebuilder.state().upstream().is_empty());
}

#[test]
fn test_missing_appended_root_is_treated_as_empty() {
    let fixture = Fixture::new();
    std::fs::remove_dir_all(&fixture.roots.appended).unwrap();
    fixture.write_upstream("out.js", "u");
    let mut rebuilder = fixture.rebuilder(&[("A", "out.js")], &[], LinkMode::Auto);

    rebuilder.rebuild().unwrap();
    assert_eq!(fixture.read_output("out.js"), "u");
    assert!(rebuilder.rebuild().unwrap().is_noop());
}
