//! Property-based tests for the snapshot differ

use graft::tree::{calculate_patch, Entry, PatchOperation, Snapshot};
use proptest::prelude::*;
use std::collections::BTreeMap;
use std::time::{Duration, SystemTime};

/// A small tree: file paths up to two directories deep, with a size each.
/// Parent directories are added so the snapshot is a well-formed tree.
fn tree_strategy() -> impl Strategy<Value = BTreeMap<String, u64>> {
    let segment = prop::sample::select(vec!["a", "b", "c"]);
    let path = prop::collection::vec(segment, 1..=3).prop_map(|parts| {
        let mut path = parts.join("/");
        path.push_str(".js");
        path
    });
    prop::collection::btree_map(path, 0u64..4, 0..8)
}

fn snapshot_of(files: &BTreeMap<String, u64>) -> Snapshot {
    let mut entries = Vec::new();
    for (path, size) in files {
        let segments: Vec<&str> = path.split('/').collect();
        for depth in 1..segments.len() {
            entries.push(Entry::directory(segments[..depth].join("/"), 0o755, SystemTime::UNIX_EPOCH));
        }
        entries.push(Entry::file(
            path.clone(),
            0o644,
            *size,
            SystemTime::UNIX_EPOCH + Duration::from_secs(*size),
        ));
    }
    Snapshot::from_entries(entries).0
}

/// Apply a patch to a path -> entry model, checking ordering as it goes
fn apply(previous: &Snapshot, patch: &[PatchOperation]) -> Result<BTreeMap<String, Entry>, String> {
    let mut model: BTreeMap<String, Entry> = previous
        .entries()
        .iter()
        .map(|e| (e.relative_path.clone(), e.clone()))
        .collect();

    let parent_exists = |model: &BTreeMap<String, Entry>, path: &str| match path.rsplit_once('/') {
        Some((parent, _)) => model.get(parent).map(|e| e.is_directory()).unwrap_or(false),
        None => true,
    };

    for op in patch {
        let path = op.relative_path().to_string();
        match op {
            PatchOperation::Unlink { .. } => {
                model.remove(&path).ok_or(format!("unlink of missing {}", path))?;
            }
            PatchOperation::Rmdir { .. } => {
                let prefix = format!("{}/", path);
                if model.keys().any(|k| k.starts_with(&prefix)) {
                    return Err(format!("rmdir of non-empty {}", path));
                }
                model.remove(&path).ok_or(format!("rmdir of missing {}", path))?;
            }
            PatchOperation::Mkdir { .. } => {
                if !parent_exists(&model, &path) || model.contains_key(&path) {
                    return Err(format!("bad mkdir {}", path));
                }
                model.insert(path.clone(), Entry::directory(path, 0o755, SystemTime::UNIX_EPOCH));
            }
            PatchOperation::Create { entry } => {
                if !parent_exists(&model, &path) || model.contains_key(&path) {
                    return Err(format!("bad create {}", path));
                }
                model.insert(path, entry.clone());
            }
            PatchOperation::Change { entry } => {
                model.insert(path, entry.clone()).ok_or("change of missing entry".to_string())?;
            }
        }
    }
    Ok(model)
}

proptest! {
    #[test]
    fn test_patch_transforms_previous_into_next(
        before in tree_strategy(),
        after in tree_strategy(),
    ) {
        let previous = snapshot_of(&before);
        let next = snapshot_of(&after);
        let patch = calculate_patch(&previous, &next);

        let model = apply(&previous, &patch).map_err(TestCaseError::fail)?;
        let paths: Vec<&String> = model.keys().collect();
        let expected: Vec<&String> = next.entries().iter().map(|e| &e.relative_path).collect();
        let mut expected_sorted = expected.clone();
        expected_sorted.sort();
        prop_assert_eq!(paths, expected_sorted);

        for entry in next.entries() {
            let applied = &model[&entry.relative_path];
            prop_assert!(applied.is_equal(entry));
        }
    }

    #[test]
    fn test_identical_snapshots_have_empty_patch(files in tree_strategy()) {
        let snapshot = snapshot_of(&files);
        prop_assert!(calculate_patch(&snapshot, &snapshot.clone()).is_empty());
    }
}
