//! Passthrough resolution: relocating appended-tree directories verbatim

use crate::tree::entry::{Entry, EntryOrigin, Snapshot};
use crate::tree::path::{first_segment, normalize_path_string, replace_first_segment};
use std::collections::BTreeMap;

/// Rewrites appended-tree entries under passthrough directories into the
/// upstream comparison space
#[derive(Debug, Clone, Default)]
pub struct PassthroughResolver {
    /// Top-level appended directory -> target prefix in the output tree
    routes: BTreeMap<String, String>,
}

impl PassthroughResolver {
    pub fn new(passthrough: &BTreeMap<String, String>) -> Self {
        let routes = passthrough
            .iter()
            .map(|(source, target)| (normalize_path_string(source), normalize_path_string(target)))
            .collect();
        Self { routes }
    }

    /// Derive relocated entries for every appended entry under a passthrough
    /// directory. Entries outside those directories are dropped.
    ///
    /// A multi-segment target also gets a directory entry for each of its
    /// ancestors, so the derived entries always form a well-formed tree.
    pub fn resolve(&self, appended: &Snapshot) -> Vec<Entry> {
        let mut derived = Vec::new();
        for entry in appended.entries() {
            let Some(target) = self.routes.get(&normalize_path_string(first_segment(&entry.relative_path))) else {
                continue;
            };
            let origin = EntryOrigin::PassthroughDerived {
                original_path: entry.relative_path.clone(),
            };

            if !entry.relative_path.contains('/') && entry.is_directory() {
                for ancestor in ancestors(target) {
                    let mut parent = Entry::directory(ancestor, entry.mode, entry.mtime);
                    parent.origin = origin.clone();
                    derived.push(parent);
                }
            }

            let mut relocated = entry.clone();
            relocated.relative_path = replace_first_segment(&entry.relative_path, target);
            relocated.origin = origin;
            derived.push(relocated);
        }
        derived
    }
}

/// Proper ancestors of a relative path, shallowest first
fn ancestors(path: &str) -> Vec<String> {
    path.match_indices('/')
        .map(|(idx, _)| path[..idx].to_string())
        .collect()
}
