//! Integration tests for configuration loading feeding a rebuild

use graft::cli::{Commands, RunContext};
use graft::config::{ConfigLoader, GraftConfig, Route, CONFIG_FILE_NAME};
use graft::tree::LinkMode;
use std::fs;
use tempfile::TempDir;

fn project_config() -> GraftConfig {
    GraftConfig {
        upstream: "upstream".into(),
        appended: "appended".into(),
        output: "dist".into(),
        mappings: vec![Route {
            source: "app".to_string(),
            target: "assets/vendor.js".to_string(),
        }],
        passthrough: vec![Route {
            source: "lazy".to_string(),
            target: "assets".to_string(),
        }],
        link: LinkMode::Copy,
        ..Default::default()
    }
}

#[test]
fn test_serialized_config_round_trips_through_loader() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    fs::write(
        root.join(CONFIG_FILE_NAME),
        toml::to_string(&project_config()).unwrap(),
    )
    .unwrap();

    let loaded = ConfigLoader::load(root).unwrap();
    assert_eq!(loaded.mappings, project_config().mappings);
    assert_eq!(loaded.passthrough, project_config().passthrough);
    assert_eq!(loaded.link, LinkMode::Copy);
    assert_eq!(loaded.output, root.join("dist"));
    assert!(loaded.validate().is_ok());
}

#[test]
fn test_build_command_from_project_config() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    fs::write(
        root.join(CONFIG_FILE_NAME),
        toml::to_string(&project_config()).unwrap(),
    )
    .unwrap();
    fs::create_dir_all(root.join("upstream/assets")).unwrap();
    fs::write(root.join("upstream/assets/vendor.js"), "vendor").unwrap();
    fs::create_dir_all(root.join("appended/app")).unwrap();
    fs::write(root.join("appended/app/a.js"), "a").unwrap();
    fs::create_dir_all(root.join("appended/lazy")).unwrap();
    fs::write(root.join("appended/lazy/chunk.js"), "chunk").unwrap();

    let ctx = RunContext::new(root, None).unwrap();
    let out = ctx
        .execute(&Commands::Build {
            format: "text".to_string(),
        })
        .unwrap();

    assert!(out.starts_with("Rebuilt"), "unexpected output: {}", out);
    assert_eq!(
        fs::read_to_string(root.join("dist/assets/vendor.js")).unwrap(),
        "vendor;\na"
    );
    assert_eq!(
        fs::read_to_string(root.join("dist/assets/chunk.js")).unwrap(),
        "chunk"
    );
}

#[test]
fn test_invalid_config_is_rejected_before_building() {
    let temp_dir = TempDir::new().unwrap();
    let mut config = project_config();
    config.mappings.push(Route {
        source: "app/nested".to_string(),
        target: "x.js".to_string(),
    });
    config.resolve_paths(temp_dir.path());

    let ctx = RunContext::with_config(config);
    let err = ctx.execute(&Commands::Validate).unwrap_err();
    assert!(graft::cli::map_error(&err).contains("single top-level directory"));
}
