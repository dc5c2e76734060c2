//! Configuration System
//!
//! Layered configuration: built-in defaults, then `graft.toml` in the project
//! root (or an explicit file), then `GRAFT_*` environment variables.

use crate::error::GraftError;
use crate::logging::LoggingConfig;
use crate::merge::{MergeOptions, TreeRoots};
use crate::tree::path::extension;
use crate::tree::LinkMode;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Component, Path, PathBuf};

mod defaults;
mod sources;

pub use sources::CONFIG_FILE_NAME;

/// One `source -> target` association from the configuration file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    /// Top-level directory of the appended tree
    pub source: String,
    /// Output file (mappings) or output directory prefix (passthrough)
    pub target: String,
}

/// Watch mode settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchSettings {
    /// Quiet period after the last filesystem event before rebuilding
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_debounce_ms() -> u64 {
    100
}

impl Default for WatchSettings {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
        }
    }
}

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraftConfig {
    /// Upstream tree root
    pub upstream: PathBuf,
    /// Appended tree root
    pub appended: PathBuf,
    /// Output tree root, exclusively managed by graft
    pub output: PathBuf,

    /// How unmerged files are placed in the output tree
    #[serde(default)]
    pub link: LinkMode,

    /// Appended directories concatenated into upstream files
    #[serde(default)]
    pub mappings: Vec<Route>,

    /// Appended directories relocated verbatim
    #[serde(default)]
    pub passthrough: Vec<Route>,

    #[serde(default)]
    pub watch: WatchSettings,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for GraftConfig {
    fn default() -> Self {
        Self {
            upstream: PathBuf::from("upstream"),
            appended: PathBuf::from("appended"),
            output: PathBuf::from("dist"),
            link: LinkMode::default(),
            mappings: Vec::new(),
            passthrough: Vec::new(),
            watch: WatchSettings::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl GraftConfig {
    /// Validate the configuration.
    ///
    /// A directory used both as a mapping source and a passthrough source is
    /// not rejected here.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        for (name, dir) in [
            ("upstream", &self.upstream),
            ("appended", &self.appended),
            ("output", &self.output),
        ] {
            if dir.as_os_str().is_empty() {
                errors.push(format!("{} directory cannot be empty", name));
            }
        }
        // The first rebuild clears the output directory
        for (name, dir) in [("upstream", &self.upstream), ("appended", &self.appended)] {
            if !self.output.as_os_str().is_empty() && !dir.as_os_str().is_empty() && overlaps(&self.output, dir) {
                errors.push(format!(
                    "output directory {:?} must not contain or lie inside the {} directory {:?}",
                    self.output, name, dir
                ));
            }
        }

        validate_routes("mappings", &self.mappings, &mut errors);
        validate_routes("passthrough", &self.passthrough, &mut errors);
        for route in &self.mappings {
            if extension(&route.target).is_empty() {
                errors.push(format!(
                    "mappings: target '{}' needs a file extension to select appended files",
                    route.target
                ));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Resolve relative tree roots against `root`
    pub fn resolve_paths(&mut self, root: &Path) {
        for dir in [&mut self.upstream, &mut self.appended, &mut self.output] {
            if dir.is_relative() {
                *dir = root.join(&*dir);
            }
            if let Some(canonical) = canonicalize_existing(dir) {
                *dir = canonical;
            }
        }
    }

    pub fn tree_roots(&self) -> TreeRoots {
        TreeRoots {
            upstream: self.upstream.clone(),
            appended: self.appended.clone(),
            output: self.output.clone(),
        }
    }

    pub fn merge_options(&self) -> MergeOptions {
        MergeOptions {
            mappings: to_map(&self.mappings),
            passthrough: to_map(&self.passthrough),
            link_mode: self.link,
        }
    }
}

/// Canonicalize a path, or its parent when the path itself does not exist yet
fn canonicalize_existing(path: &Path) -> Option<PathBuf> {
    if let Ok(canonical) = dunce::canonicalize(path) {
        return Some(canonical);
    }
    let parent = dunce::canonicalize(path.parent()?).ok()?;
    Some(parent.join(path.file_name()?))
}

/// Lexical form of a path: `.` dropped, `..` applied to the preceding component
fn lexical(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other),
        }
    }
    out
}

/// Whether either path is the other or one of its ancestors
fn overlaps(a: &Path, b: &Path) -> bool {
    let (a, b) = (lexical(a), lexical(b));
    a.starts_with(&b) || b.starts_with(&a)
}

fn to_map(routes: &[Route]) -> BTreeMap<String, String> {
    routes
        .iter()
        .map(|route| (route.source.clone(), route.target.clone()))
        .collect()
}

fn validate_routes(section: &str, routes: &[Route], errors: &mut Vec<String>) {
    let mut seen = BTreeSet::new();
    for route in routes {
        let source = route.source.trim_matches('/');
        if source.is_empty() || source.contains('/') {
            errors.push(format!(
                "{}: source '{}' must be a single top-level directory name",
                section, route.source
            ));
        }
        if route.target.trim_matches('/').is_empty() {
            errors.push(format!("{}: target for '{}' cannot be empty", section, route.source));
        }
        if Path::new(&route.target).is_absolute() {
            errors.push(format!(
                "{}: target '{}' must be relative to the output directory",
                section, route.target
            ));
        }
        if !seen.insert(source) {
            errors.push(format!("{}: duplicate source '{}'", section, route.source));
        }
    }
}

/// Loads configuration from files and the environment
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for a project root, resolving tree roots against it
    pub fn load(root: &Path) -> Result<GraftConfig, GraftError> {
        let builder = defaults::builder_with_defaults()?;
        let builder = sources::add_project_file(builder, root)?;
        let builder = sources::add_environment(builder)?;

        let mut config: GraftConfig = builder.build()?.try_deserialize()?;
        config.resolve_paths(root);
        Ok(config)
    }

    /// Load configuration from an explicit file; tree roots resolve against
    /// the file's directory
    pub fn load_from_file(path: &Path) -> Result<GraftConfig, GraftError> {
        let builder = defaults::builder_with_defaults()?;
        let builder = sources::add_file(builder, path)?;
        let builder = sources::add_environment(builder)?;

        let mut config: GraftConfig = builder.build()?.try_deserialize()?;
        let root = path.parent().unwrap_or_else(|| Path::new("."));
        config.resolve_paths(root);
        Ok(config)
    }
}
