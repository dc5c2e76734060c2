//! Placing input files into the output tree

use crate::error::GraftError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

/// How a file is placed at its destination
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkMode {
    /// Hard link when possible, otherwise copy
    #[default]
    Auto,
    /// Always copy the bytes
    Copy,
}

/// Place `src` at `dest` using `mode`.
///
/// `dest` must not exist; callers remove stale outputs first.
pub fn copy_or_link(src: &Path, dest: &Path, mode: LinkMode) -> Result<(), GraftError> {
    if mode == LinkMode::Auto {
        match fs::hard_link(src, dest) {
            Ok(()) => return Ok(()),
            Err(e) => {
                debug!(
                    src = %src.display(),
                    dest = %dest.display(),
                    error = %e,
                    "Hard link failed, falling back to copy"
                );
            }
        }
    }

    fs::copy(src, dest).map_err(|e| GraftError::io(dest, e))?;
    Ok(())
}

/// Remove a file, treating an already missing file as success
pub fn remove_file_if_exists(path: &Path) -> Result<(), GraftError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(GraftError::io(path, e)),
    }
}
