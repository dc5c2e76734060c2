//! Relative path utilities
//!
//! Every path inside a snapshot is POSIX-style, `/`-separated and never
//! begins with a separator. Snapshot paths keep the on-disk spelling of each
//! name so they can be joined back onto a root; only configured route keys
//! are NFC-normalized, and lookups normalize the queried segment the same way.

use crate::error::GraftError;
use std::cmp::Ordering;
use std::path::{Component, Path};
use unicode_normalization::UnicodeNormalization;

/// Convert a path under `root` into a POSIX relative path.
///
/// Names that are not valid UTF-8 are rejected with `InvalidPath`.
pub fn to_posix_relative(root: &Path, path: &Path) -> Result<String, GraftError> {
    let relative = path.strip_prefix(root).map_err(|_| {
        GraftError::InvalidPath(format!("{:?} is not under {:?}", path, root))
    })?;

    let mut segments = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(name) => match name.to_str() {
                Some(name) => segments.push(name),
                None => {
                    return Err(GraftError::InvalidPath(format!(
                        "{:?} is not valid UTF-8",
                        relative
                    )))
                }
            },
            Component::CurDir => {}
            other => {
                return Err(GraftError::InvalidPath(format!(
                    "Unexpected component {:?} in {:?}",
                    other, relative
                )))
            }
        }
    }

    Ok(segments.join("/"))
}

/// Normalize a configured route key without filesystem access
///
/// Unicode is normalized to NFC and leading/trailing separators are dropped.
pub fn normalize_path_string(path: &str) -> String {
    let normalized: String = path.nfc().collect();
    normalized.trim_matches('/').to_string()
}

/// First `/`-separated segment of a relative path
pub fn first_segment(path: &str) -> &str {
    path.split('/').next().unwrap_or(path)
}

/// Replace the first segment of `path` with `prefix`
pub fn replace_first_segment(path: &str, prefix: &str) -> String {
    match path.split_once('/') {
        Some((_, rest)) => format!("{}/{}", prefix, rest),
        None => prefix.to_string(),
    }
}

/// Component-wise ordering, so a directory always sorts before its children
pub fn compare_paths(a: &str, b: &str) -> Ordering {
    a.split('/').cmp(b.split('/'))
}

/// Extension of the last segment including the dot, or an empty string
pub fn extension(path: &str) -> &str {
    let name = path.rsplit('/').next().unwrap_or(path);
    match name.rfind('.') {
        Some(0) | None => "",
        Some(idx) => &name[idx..],
    }
}
