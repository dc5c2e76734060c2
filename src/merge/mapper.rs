//! Mapping appended-tree changes onto the output files they feed

use crate::tree::diff::PatchOperation;
use crate::tree::path::{first_segment, normalize_path_string};
use std::collections::{BTreeMap, BTreeSet};

/// Directory -> target file association, with its inverse
#[derive(Debug, Clone, Default)]
pub struct Mappings {
    forward: BTreeMap<String, String>,
    reverse: BTreeMap<String, String>,
}

impl Mappings {
    pub fn new(mappings: &BTreeMap<String, String>) -> Self {
        let forward: BTreeMap<String, String> = mappings
            .iter()
            .map(|(dir, target)| (normalize_path_string(dir), normalize_path_string(target)))
            .collect();
        let reverse = forward
            .iter()
            .map(|(dir, target)| (target.clone(), dir.clone()))
            .collect();
        Self { forward, reverse }
    }

    /// Output file fed by a top-level appended directory
    pub fn target_for(&self, dir: &str) -> Option<&str> {
        self.forward.get(&normalize_path_string(dir)).map(String::as_str)
    }

    /// Appended directory feeding an output file
    pub fn source_for(&self, target: &str) -> Option<&str> {
        self.reverse.get(&normalize_path_string(target)).map(String::as_str)
    }

    pub fn is_target(&self, path: &str) -> bool {
        self.reverse.contains_key(&normalize_path_string(path))
    }
}

/// Merge targets whose appended content moved in `patch`
pub fn affected_targets(mappings: &Mappings, patch: &[PatchOperation]) -> BTreeSet<String> {
    patch
        .iter()
        .filter_map(|op| mappings.target_for(first_segment(op.relative_path())))
        .map(str::to_string)
        .collect()
}
