//! Output materializer
//!
//! One rebuild runs three phases:
//! - A: diff the appended tree and collect the merge targets it feeds
//! - B: diff the upstream comparison space (real upstream entries plus
//!   passthrough-derived ones) and apply the patch to the output tree
//! - C: merge every target from phase A that phase B did not handle

use crate::error::GraftError;
use crate::merge::engine::{MergeEngine, MergeOutcome, TreeRoots};
use crate::merge::mapper::{affected_targets, Mappings};
use crate::merge::passthrough::PassthroughResolver;
use crate::tree::diff::{DiffState, PatchOperation};
use crate::tree::entry::{Entry, EntryOrigin, Snapshot};
use crate::tree::link::{copy_or_link, remove_file_if_exists, LinkMode};
use crate::tree::walker;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::ErrorKind;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Combination rules for a rebuilder
#[derive(Debug, Clone, Default)]
pub struct MergeOptions {
    /// Top-level appended directory -> output file it is appended to
    pub mappings: BTreeMap<String, String>,
    /// Top-level appended directory -> output prefix it is relocated under
    pub passthrough: BTreeMap<String, String>,
    pub link_mode: LinkMode,
}

/// Counts of the filesystem work done by one rebuild
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RebuildReport {
    pub unlinked: usize,
    pub removed_dirs: usize,
    pub created_dirs: usize,
    pub created: usize,
    pub changed: usize,
    /// Merge targets recomputed while applying the upstream patch
    pub merged: usize,
    /// Merge targets recomputed only because their appended content moved
    pub flushed: usize,
    pub duration_ms: u64,
}

impl RebuildReport {
    /// True when the rebuild touched nothing in the output tree
    pub fn is_noop(&self) -> bool {
        self.operations() == 0
    }

    pub fn operations(&self) -> usize {
        self.unlinked + self.removed_dirs + self.created_dirs + self.created + self.changed + self.flushed
    }
}

/// Incremental merger of an upstream tree and an appended tree
pub struct Rebuilder {
    roots: TreeRoots,
    mappings: Mappings,
    passthrough: PassthroughResolver,
    link_mode: LinkMode,
    state: DiffState,
    initialized: bool,
}

impl Rebuilder {
    pub fn new(roots: TreeRoots, options: &MergeOptions) -> Self {
        Self {
            roots,
            mappings: Mappings::new(&options.mappings),
            passthrough: PassthroughResolver::new(&options.passthrough),
            link_mode: options.link_mode,
            state: DiffState::new(),
            initialized: false,
        }
    }

    pub fn roots(&self) -> &TreeRoots {
        &self.roots
    }

    pub fn state(&self) -> &DiffState {
        &self.state
    }

    /// Bring the output tree up to date with both input trees
    pub fn rebuild(&mut self) -> Result<RebuildReport, GraftError> {
        let started = Instant::now();
        self.prepare_output()?;

        // Phase A
        let appended = walker::snapshot(&self.roots.appended)?;
        let derived = self.passthrough.resolve(&appended);
        let appended_patch = self.state.diff_appended(appended);
        let mut outstanding = affected_targets(&self.mappings, &appended_patch);

        // Phase B
        let upstream_space = self.upstream_space(derived)?;
        let patch = self.state.diff_upstream(upstream_space);

        let mut report = RebuildReport::default();
        let engine = MergeEngine::new(&self.roots, &self.mappings, self.link_mode);
        for op in &patch {
            debug!(op = op.kind(), path = op.relative_path(), "Applying patch operation");
            self.apply(&engine, op, &mut outstanding, &mut report)?;
        }

        // Phase C
        for target in &outstanding {
            let outcome = engine.merge(target)?;
            debug!(path = %target, outcome = ?outcome, "Flushed merge target");
            report.flushed += 1;
        }

        report.duration_ms = started.elapsed().as_millis() as u64;
        info!(
            operations = report.operations(),
            merged = report.merged,
            flushed = report.flushed,
            duration_ms = report.duration_ms,
            "Rebuild complete"
        );
        Ok(report)
    }

    /// The first rebuild starts from an empty baseline, so any stale output
    /// from an earlier process is cleared
    fn prepare_output(&mut self) -> Result<(), GraftError> {
        let output = &self.roots.output;
        if !self.initialized {
            match fs::remove_dir_all(output) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(GraftError::io(output, e)),
            }
            self.initialized = true;
        }
        fs::create_dir_all(output).map_err(|e| GraftError::io(output, e))
    }

    /// Real upstream entries unioned with passthrough-derived entries.
    ///
    /// Derived entries sort after real ones, so on a path collision the
    /// passthrough entry is kept.
    fn upstream_space(&self, derived: Vec<Entry>) -> Result<Snapshot, GraftError> {
        let mut entries = walker::snapshot(&self.roots.upstream)?.into_entries();
        entries.extend(derived);

        let (space, collisions) = Snapshot::from_entries(entries);
        for path in collisions {
            warn!(path = %path, "Passthrough entry shadows an upstream entry");
        }
        Ok(space)
    }

    fn apply(
        &self,
        engine: &MergeEngine<'_>,
        op: &PatchOperation,
        outstanding: &mut BTreeSet<String>,
        report: &mut RebuildReport,
    ) -> Result<(), GraftError> {
        let output_path = self.roots.output.join(op.relative_path());

        match op {
            PatchOperation::Unlink { .. } => {
                remove_file_if_exists(&output_path)?;
                report.unlinked += 1;
            }
            PatchOperation::Rmdir { .. } => {
                match fs::remove_dir(&output_path) {
                    Ok(()) => {}
                    Err(e) if e.kind() == ErrorKind::NotFound => {}
                    Err(e) => return Err(GraftError::io(&output_path, e)),
                }
                report.removed_dirs += 1;
            }
            PatchOperation::Mkdir { .. } => {
                fs::create_dir_all(&output_path).map_err(|e| GraftError::io(&output_path, e))?;
                report.created_dirs += 1;
            }
            PatchOperation::Change { entry } => {
                remove_file_if_exists(&output_path)?;
                self.create(engine, entry, outstanding, report)?;
                report.changed += 1;
            }
            PatchOperation::Create { entry } => {
                self.create(engine, entry, outstanding, report)?;
                report.created += 1;
            }
        }
        Ok(())
    }

    fn create(
        &self,
        engine: &MergeEngine<'_>,
        entry: &Entry,
        outstanding: &mut BTreeSet<String>,
        report: &mut RebuildReport,
    ) -> Result<(), GraftError> {
        let path = entry.relative_path.as_str();

        if self.mappings.is_target(path) {
            let outcome = engine.merge(path)?;
            outstanding.remove(path);
            if outcome == MergeOutcome::Merged {
                report.merged += 1;
            }
            return Ok(());
        }

        let source = match &entry.origin {
            EntryOrigin::PassthroughDerived { original_path } => self.roots.appended.join(original_path),
            EntryOrigin::Plain => self.roots.upstream.join(path),
        };
        let output_path = self.roots.output.join(path);
        remove_file_if_exists(&output_path)?;
        copy_or_link(&source, &output_path, self.link_mode)
    }
}
