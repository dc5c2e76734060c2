//! Integration tests for passthrough directories

use crate::integration::test_utils::set_mtime;
use crate::integration::Fixture;
use graft::tree::LinkMode;
use std::fs;

const PASSTHROUGH: &[(&str, &str)] = &[("lazy", "assets")];

#[test]
fn test_passthrough_copy() {
    let fixture = Fixture::new();
    fixture.write_upstream("assets/app.js", "app");
    fixture.write_appended("lazy/chunk.js", "chunk v1");
    let mut rebuilder = fixture.rebuilder(&[], PASSTHROUGH, LinkMode::Copy);

    rebuilder.rebuild().unwrap();
    assert_eq!(
        fs::read(fixture.output("assets/chunk.js")).unwrap(),
        fs::read(fixture.appended("lazy/chunk.js")).unwrap()
    );
    assert_eq!(fixture.read_output("assets/app.js"), "app");
    assert!(!fixture.output("lazy").exists());
}

#[test]
fn test_passthrough_rematerialized_on_change() {
    let fixture = Fixture::new();
    fixture.write_upstream("index.html", "<html></html>");
    fixture.write_appended("lazy/chunk.js", "chunk v1");
    set_mtime(&fixture.appended("lazy/chunk.js"), 1);
    let mut rebuilder = fixture.rebuilder(&[], PASSTHROUGH, LinkMode::Copy);
    rebuilder.rebuild().unwrap();

    fixture.write_appended("lazy/chunk.js", "chunk version 2");
    set_mtime(&fixture.appended("lazy/chunk.js"), 2);
    let report = rebuilder.rebuild().unwrap();

    assert_eq!(report.changed, 1);
    assert_eq!(fixture.read_output("assets/chunk.js"), "chunk version 2");
}

#[test]
fn test_passthrough_creates_target_directory() {
    let fixture = Fixture::new();
    fixture.write_appended("lazy/nested/chunk.js", "chunk");
    let mut rebuilder = fixture.rebuilder(&[], PASSTHROUGH, LinkMode::Auto);

    rebuilder.rebuild().unwrap();
    assert_eq!(fixture.read_output("assets/nested/chunk.js"), "chunk");
}

#[test]
fn test_passthrough_removal_propagates() {
    let fixture = Fixture::new();
    fixture.write_appended("lazy/chunk.js", "chunk");
    let mut rebuilder = fixture.rebuilder(&[], PASSTHROUGH, LinkMode::Auto);
    rebuilder.rebuild().unwrap();

    fs::remove_dir_all(fixture.appended("lazy")).unwrap();
    let report = rebuilder.rebuild().unwrap();

    assert_eq!(report.unlinked, 1);
    assert_eq!(report.removed_dirs, 1);
    assert!(!fixture.output("assets").exists());
}

#[test]
fn test_passthrough_shadows_upstream_on_collision() {
    let fixture = Fixture::new();
    fixture.write_upstream("assets/chunk.js", "from upstream");
    fixture.write_appended("lazy/chunk.js", "from appended");
    let mut rebuilder = fixture.rebuilder(&[], PASSTHROUGH, LinkMode::Auto);

    rebuilder.rebuild().unwrap();
    assert_eq!(fixture.read_output("assets/chunk.js"), "from appended");
}

#[test]
fn test_unrouted_appended_directories_are_ignored() {
    let fixture = Fixture::new();
    fixture.write_upstream("index.html", "<html></html>");
    let mut rebuilder = fixture.rebuilder(&[("A", "out.js")], PASSTHROUGH, LinkMode::Auto);
    rebuilder.rebuild().unwrap();

    fixture.write_appended("other/x.js", "x");
    let report = rebuilder.rebuild().unwrap();

    assert!(report.is_noop());
    assert!(!fixture.output("other").exists());
}

#[test]
fn test_nested_passthrough_survives_upstream_directory_removal() {
    let fixture = Fixture::new();
    fixture.write_upstream("assets/a.js", "a");
    fixture.write_appended("lazy/chunk.js", "chunk");
    let mut rebuilder = fixture.rebuilder(&[], &[("lazy", "assets/lazy")], LinkMode::Auto);
    rebuilder.rebuild().unwrap();
    assert_eq!(fixture.read_output("assets/lazy/chunk.js"), "chunk");

    fs::remove_dir_all(fixture.upstream("assets")).unwrap();
    let report = rebuilder.rebuild().unwrap();

    assert_eq!(report.unlinked, 1);
    assert_eq!(report.removed_dirs, 0);
    assert!(!fixture.output("assets/a.js").exists());
    assert_eq!(fixture.read_output("assets/lazy/chunk.js"), "chunk");
    assert!(rebuilder.rebuild().unwrap().is_noop());
}

#[test]
fn test_nested_passthrough_removal_leaves_no_orphan_directories() {
    let fixture = Fixture::new();
    fixture.write_upstream("index.html", "<html></html>");
    fixture.write_appended("lazy/chunk.js", "chunk");
    let mut rebuilder = fixture.rebuilder(&[], &[("lazy", "assets/js/lazy")], LinkMode::Auto);
    rebuilder.rebuild().unwrap();
    assert_eq!(fixture.read_output("assets/js/lazy/chunk.js"), "chunk");

    fs::remove_dir_all(fixture.appended("lazy")).unwrap();
    let report = rebuilder.rebuild().unwrap();

    assert_eq!(report.unlinked, 1);
    assert_eq!(report.removed_dirs, 3);
    assert!(!fixture.output("assets").exists());
    assert_eq!(fixture.read_output("index.html"), "<html></html>");
}

#[test]
fn test_decomposed_file_names_are_materialized() {
    let fixture = Fixture::new();
    let upstream_name = "cafe\u{0301}.js";
    let chunk_name = "lazy/nai\u{0308}ve.js";
    fixture.write_upstream(upstream_name, "upstream");
    fixture.write_appended(chunk_name, "chunk");
    let mut rebuilder = fixture.rebuilder(&[], PASSTHROUGH, LinkMode::Copy);

    rebuilder.rebuild().unwrap();
    assert_eq!(fixture.read_output(upstream_name), "upstream");
    assert_eq!(fixture.read_output("assets/nai\u{0308}ve.js"), "chunk");
    assert!(rebuilder.rebuild().unwrap().is_noop());
}
