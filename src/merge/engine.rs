//! Merge engine: materializes one merge target
//!
//! A merge target's content is the upstream file's text with every matching
//! file of its appended directory spliced in. Targets with nothing to append
//! are linked verbatim, and targets whose upstream file is gone are removed.

use crate::error::GraftError;
use crate::merge::mapper::Mappings;
use crate::merge::splice::insert_before_source_map;
use crate::tree::link::{copy_or_link, remove_file_if_exists, LinkMode};
use crate::tree::path::extension;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Root directories of one rebuild
#[derive(Debug, Clone)]
pub struct TreeRoots {
    pub upstream: PathBuf,
    pub appended: PathBuf,
    pub output: PathBuf,
}

/// What the engine did with a merge target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Upstream file is gone; the output was removed
    Removed,
    /// Nothing to append; the upstream file was placed verbatim
    Linked,
    /// Appended content was spliced in and written
    Merged,
}

/// Statement separator between concatenated pieces for a target path
pub fn separator_for(target: &str) -> &'static str {
    if extension(target) == ".js" {
        ";\n"
    } else {
        "\n"
    }
}

pub struct MergeEngine<'a> {
    roots: &'a TreeRoots,
    mappings: &'a Mappings,
    link_mode: LinkMode,
}

impl<'a> MergeEngine<'a> {
    pub fn new(roots: &'a TreeRoots, mappings: &'a Mappings, link_mode: LinkMode) -> Self {
        Self {
            roots,
            mappings,
            link_mode,
        }
    }

    /// Recompute the output at `relative_path`
    pub fn merge(&self, relative_path: &str) -> Result<MergeOutcome, GraftError> {
        let upstream_path = self.roots.upstream.join(relative_path);
        let output_path = self.roots.output.join(relative_path);

        if !upstream_path.is_file() {
            remove_file_if_exists(&output_path)?;
            debug!(path = relative_path, "Merge target vacated");
            return Ok(MergeOutcome::Removed);
        }

        let source_dir = match self.mappings.source_for(relative_path) {
            Some(dir) => self.roots.appended.join(dir),
            None => {
                return Err(GraftError::InvalidPath(format!(
                    "{} is not a mapped merge target",
                    relative_path
                )))
            }
        };

        if !source_dir.is_dir() {
            self.link_verbatim(&upstream_path, &output_path)?;
            return Ok(MergeOutcome::Linked);
        }

        let separator = separator_for(relative_path);
        let appended = concat_sources(&source_dir, extension(relative_path), separator)?;

        if appended.is_empty() {
            self.link_verbatim(&upstream_path, &output_path)?;
            return Ok(MergeOutcome::Linked);
        }

        let upstream = read_text(&upstream_path)?;
        let merged = insert_before_source_map(&upstream, separator, &appended);

        // The old output may be a hard link to the upstream file
        remove_file_if_exists(&output_path)?;
        fs::write(&output_path, merged).map_err(|e| GraftError::io(&output_path, e))?;

        debug!(
            path = relative_path,
            appended_bytes = appended.len(),
            "Merged appended content"
        );
        Ok(MergeOutcome::Merged)
    }

    fn link_verbatim(&self, upstream_path: &Path, output_path: &Path) -> Result<(), GraftError> {
        remove_file_if_exists(output_path)?;
        copy_or_link(upstream_path, output_path, self.link_mode)
    }
}

/// Concatenate every file directly in `dir` whose name ends in `ext`, in
/// file name order. An empty `ext` selects nothing.
fn concat_sources(dir: &Path, ext: &str, separator: &str) -> Result<String, GraftError> {
    if ext.is_empty() {
        return Ok(String::new());
    }

    let mut names = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| GraftError::io(dir, e))? {
        let entry = entry.map_err(|e| GraftError::io(dir, e))?;
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.ends_with(ext) && path.is_file() {
            names.push((name, path));
        }
    }
    names.sort();

    let pieces = names
        .iter()
        .map(|(_, path)| read_text(path))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(pieces.join(separator))
}

fn read_text(path: &Path) -> Result<String, GraftError> {
    let bytes = fs::read(path).map_err(|e| GraftError::io(path, e))?;
    String::from_utf8(bytes).map_err(|_| GraftError::InvalidUtf8 {
        path: path.to_path_buf(),
    })
}
