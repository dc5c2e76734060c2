//! Snapshot differ
//!
//! Turns two sorted, duplicate-free snapshots of the same tree into an ordered
//! patch. Removals come first, deepest paths first, so a directory is only
//! removed once it is empty. Additions and changes follow in forward order, so
//! a directory is created before its children.

use crate::tree::entry::{Entry, Snapshot};
use crate::tree::path::compare_paths;
use std::cmp::Ordering;

/// One filesystem operation of a patch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchOperation {
    Unlink { path: String },
    Rmdir { path: String },
    Mkdir { path: String },
    Create { entry: Entry },
    Change { entry: Entry },
}

impl PatchOperation {
    /// Relative path the operation applies to
    pub fn relative_path(&self) -> &str {
        match self {
            PatchOperation::Unlink { path }
            | PatchOperation::Rmdir { path }
            | PatchOperation::Mkdir { path } => path,
            PatchOperation::Create { entry } | PatchOperation::Change { entry } => {
                &entry.relative_path
            }
        }
    }

    /// Short name of the operation, used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            PatchOperation::Unlink { .. } => "unlink",
            PatchOperation::Rmdir { .. } => "rmdir",
            PatchOperation::Mkdir { .. } => "mkdir",
            PatchOperation::Create { .. } => "create",
            PatchOperation::Change { .. } => "change",
        }
    }

    fn removal(entry: &Entry) -> Self {
        let path = entry.relative_path.clone();
        if entry.is_directory() {
            PatchOperation::Rmdir { path }
        } else {
            PatchOperation::Unlink { path }
        }
    }

    fn addition(entry: &Entry) -> Self {
        if entry.is_directory() {
            PatchOperation::Mkdir {
                path: entry.relative_path.clone(),
            }
        } else {
            PatchOperation::Create {
                entry: entry.clone(),
            }
        }
    }
}

/// Compute the patch transforming `previous` into `next`
pub fn calculate_patch(previous: &Snapshot, next: &Snapshot) -> Vec<PatchOperation> {
    let mut removals = Vec::new();
    let mut additions = Vec::new();

    let mut old = previous.entries().iter().peekable();
    let mut new = next.entries().iter().peekable();

    loop {
        let ordering = match (old.peek(), new.peek()) {
            (None, None) => break,
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (Some(a), Some(b)) => compare_paths(&a.relative_path, &b.relative_path),
        };

        match ordering {
            Ordering::Less => {
                if let Some(gone) = old.next() {
                    removals.push(PatchOperation::removal(gone));
                }
            }
            Ordering::Greater => {
                if let Some(added) = new.next() {
                    additions.push(PatchOperation::addition(added));
                }
            }
            Ordering::Equal => {
                let (Some(before), Some(after)) = (old.next(), new.next()) else {
                    break;
                };
                if before.kind != after.kind {
                    removals.push(PatchOperation::removal(before));
                    additions.push(PatchOperation::addition(after));
                } else if !before.is_equal(after) {
                    additions.push(PatchOperation::Change {
                        entry: after.clone(),
                    });
                }
            }
        }
    }

    removals.reverse();
    removals.extend(additions);
    removals
}

/// Cross-rebuild state: the last snapshot seen for each input tree
#[derive(Debug, Default)]
pub struct DiffState {
    upstream: Snapshot,
    appended: Snapshot,
}

impl DiffState {
    /// Both snapshots start empty, so the first rebuild creates everything
    pub fn new() -> Self {
        Self::default()
    }

    /// Diff the upstream comparison space and store `next` as the new baseline
    pub fn diff_upstream(&mut self, next: Snapshot) -> Vec<PatchOperation> {
        diff_and_replace(&mut self.upstream, next)
    }

    /// Diff the appended tree and store `next` as the new baseline
    pub fn diff_appended(&mut self, next: Snapshot) -> Vec<PatchOperation> {
        diff_and_replace(&mut self.appended, next)
    }

    pub fn upstream(&self) -> &Snapshot {
        &self.upstream
    }

    pub fn appended(&self) -> &Snapshot {
        &self.appended
    }
}

fn diff_and_replace(previous: &mut Snapshot, next: Snapshot) -> Vec<PatchOperation> {
    let patch = calculate_patch(previous, &next);
    *previous = next;
    patch
}
