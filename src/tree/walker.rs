//! Filesystem walker producing tree snapshots

use crate::error::GraftError;
use crate::tree::entry::{Entry, Snapshot};
use crate::tree::path::to_posix_relative;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::warn;
use walkdir::WalkDir;

/// Filesystem walker configuration
#[derive(Debug, Clone)]
pub struct WalkerConfig {
    /// Whether to follow symbolic links (default: true, inputs are often linked trees)
    pub follow_symlinks: bool,
    /// Maximum depth to traverse (None = unlimited)
    pub max_depth: Option<usize>,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            follow_symlinks: true,
            max_depth: None,
        }
    }
}

/// Filesystem walker
pub struct Walker {
    root: PathBuf,
    config: WalkerConfig,
}

impl Walker {
    /// Create a new walker for the given root path
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            config: WalkerConfig::default(),
        }
    }

    /// Create a walker with custom configuration
    pub fn with_config(root: PathBuf, config: WalkerConfig) -> Self {
        Self { root, config }
    }

    /// Walk the filesystem and collect a snapshot of every entry below the root.
    ///
    /// A missing root yields an empty snapshot. Names that are not valid UTF-8
    /// are skipped along with everything below them.
    pub fn walk(&self) -> Result<Snapshot, GraftError> {
        if !self.root.exists() {
            return Ok(Snapshot::new());
        }

        let mut entries = Vec::new();

        let walker = WalkDir::new(&self.root)
            .follow_links(self.config.follow_symlinks)
            .min_depth(1)
            .max_depth(self.config.max_depth.unwrap_or(usize::MAX))
            .sort_by_file_name();

        let mut iter = walker.into_iter();
        while let Some(entry) = iter.next() {
            let entry = entry?;
            let path = entry.path();

            let metadata = entry
                .metadata()
                .map_err(|e| GraftError::Walk(format!("Failed to read metadata for {:?}: {}", path, e)))?;

            let relative_path = match to_posix_relative(&self.root, path) {
                Ok(relative_path) => relative_path,
                Err(GraftError::InvalidPath(reason)) => {
                    warn!(path = ?path, reason = %reason, "Skipping entry with unusable name");
                    if metadata.is_dir() {
                        iter.skip_current_dir();
                    }
                    continue;
                }
                Err(e) => return Err(e),
            };
            let mtime = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            let mode = mode_of(&metadata);

            if metadata.is_file() {
                entries.push(Entry::file(relative_path, mode, metadata.len(), mtime));
            } else if metadata.is_dir() {
                entries.push(Entry::directory(relative_path, mode, mtime));
            }
            // Dangling links and special files are skipped
        }

        let (snapshot, _) = Snapshot::from_entries(entries);
        Ok(snapshot)
    }
}

/// Snapshot a directory with the default walker configuration
pub fn snapshot(root: &Path) -> Result<Snapshot, GraftError> {
    Walker::new(root.to_path_buf()).walk()
}

#[cfg(unix)]
fn mode_of(metadata: &std::fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode()
}

#[cfg(not(unix))]
fn mode_of(metadata: &std::fs::Metadata) -> u32 {
    if metadata.permissions().readonly() {
        0o444
    } else {
        0o644
    }
}
