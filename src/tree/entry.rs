//! Snapshot entries

use crate::tree::path::compare_paths;
use std::time::SystemTime;

/// Kind of filesystem entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// Where the content of an entry actually lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryOrigin {
    /// The entry lives at its own relative path in the tree it was read from
    Plain,
    /// Relocated from the appended tree; `original_path` is where the real file is
    PassthroughDerived { original_path: String },
}

/// A single entry of a snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub relative_path: String,
    pub kind: EntryKind,
    /// Unix permission bits (mode)
    pub mode: u32,
    pub size: u64,
    pub mtime: SystemTime,
    pub origin: EntryOrigin,
}

impl Entry {
    /// Create a plain file entry
    pub fn file(relative_path: impl Into<String>, mode: u32, size: u64, mtime: SystemTime) -> Self {
        Self {
            relative_path: relative_path.into(),
            kind: EntryKind::File,
            mode,
            size,
            mtime,
            origin: EntryOrigin::Plain,
        }
    }

    /// Create a plain directory entry
    pub fn directory(relative_path: impl Into<String>, mode: u32, mtime: SystemTime) -> Self {
        Self {
            relative_path: relative_path.into(),
            kind: EntryKind::Directory,
            mode,
            size: 0,
            mtime,
            origin: EntryOrigin::Plain,
        }
    }

    pub fn is_directory(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    /// Whether two entries at the same path describe the same content.
    ///
    /// Directories compare equal to directories regardless of stats; files
    /// compare mode, size, mtime and origin.
    pub fn is_equal(&self, other: &Entry) -> bool {
        match (self.kind, other.kind) {
            (EntryKind::Directory, EntryKind::Directory) => true,
            (EntryKind::File, EntryKind::File) => {
                self.mode == other.mode
                    && self.size == other.size
                    && self.mtime == other.mtime
                    && self.origin == other.origin
            }
            _ => false,
        }
    }
}

/// Ordered, duplicate-free listing of one tree at one point in time
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    entries: Vec<Entry>,
}

impl Snapshot {
    /// Create an empty snapshot
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a snapshot from entries in any order.
    ///
    /// Sorting is stable; when several entries share a path the last one in
    /// input order wins. Returns the snapshot and the paths where a file was
    /// involved in such a collision (directories merging is not reported).
    pub fn from_entries(mut entries: Vec<Entry>) -> (Self, Vec<String>) {
        entries.sort_by(|a, b| compare_paths(&a.relative_path, &b.relative_path));

        let mut deduped: Vec<Entry> = Vec::with_capacity(entries.len());
        let mut collisions = Vec::new();
        for entry in entries {
            match deduped.last_mut() {
                Some(last) if last.relative_path == entry.relative_path => {
                    if !(last.is_directory() && entry.is_directory()) {
                        collisions.push(entry.relative_path.clone());
                    }
                    *last = entry;
                }
                _ => deduped.push(entry),
            }
        }

        (Self { entries: deduped }, collisions)
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<Entry> {
        self.entries
    }
}
