//! Watch Mode
//!
//! Long-lived loop that rebuilds the output tree whenever either input tree
//! changes. Filesystem events are debounced into batches and rebuilds run one
//! at a time on the watching thread.

use crate::error::GraftError;
use crate::merge::Rebuilder;
use notify::{Event, RecursiveMode, Watcher};
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Lower bound on how often an idle watcher rechecks its running flag
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Watch mode configuration
#[derive(Debug, Clone)]
pub struct WatchConfig {
    /// Quiet period after the last event before a batch is rebuilt
    pub debounce_ms: u64,
    /// Stop after this many rebuilds, including the initial one
    pub max_rebuilds: Option<usize>,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 100,
            max_rebuilds: None,
        }
    }
}

/// Rebuilds a [`Rebuilder`] on input changes
pub struct WatchDaemon {
    rebuilder: Rebuilder,
    config: WatchConfig,
    running: Arc<RwLock<bool>>,
}

impl WatchDaemon {
    pub fn new(rebuilder: Rebuilder, config: WatchConfig) -> Self {
        Self {
            rebuilder,
            config,
            running: Arc::new(RwLock::new(false)),
        }
    }

    /// Handle that stops the loop when set to false, including while idle
    pub fn running_flag(&self) -> Arc<RwLock<bool>> {
        Arc::clone(&self.running)
    }

    /// Run the initial rebuild, then rebuild after every batch of events
    pub fn start(&mut self) -> Result<(), GraftError> {
        *self.running.write() = true;

        let (tx, rx) = mpsc::channel();
        let mut watcher = notify::recommended_watcher(move |res| {
            if let Err(e) = tx.send(res) {
                error!("Error sending watch event: {}", e);
            }
        })
        .map_err(|e| GraftError::Config(format!("Failed to create watcher: {}", e)))?;

        let roots = self.rebuilder.roots().clone();
        for root in [&roots.upstream, &roots.appended] {
            if root.exists() {
                watcher
                    .watch(root, RecursiveMode::Recursive)
                    .map_err(|e| GraftError::Config(format!("Failed to watch {:?}: {}", root, e)))?;
                info!(root = %root.display(), "Watching input tree");
            } else {
                warn!(root = %root.display(), "Input tree does not exist, not watching it");
            }
        }

        let mut rebuilds = 0;
        self.rebuild_logged(&mut rebuilds);

        let debounce = Duration::from_millis(self.config.debounce_ms);
        while *self.running.read() && !self.reached_limit(rebuilds) {
            let Some(paths) = next_batch(&rx, debounce, &roots.output, &self.running) else {
                break;
            };
            if paths.is_empty() {
                continue;
            }
            debug!(changed = paths.len(), "Filesystem change batch");
            self.rebuild_logged(&mut rebuilds);
        }

        *self.running.write() = false;
        info!(rebuilds, "Watch stopped");
        Ok(())
    }

    fn reached_limit(&self, rebuilds: usize) -> bool {
        self.config.max_rebuilds.is_some_and(|max| rebuilds >= max)
    }

    /// A failed rebuild is reported and the loop keeps watching
    fn rebuild_logged(&mut self, rebuilds: &mut usize) {
        *rebuilds += 1;
        if let Err(e) = self.rebuilder.rebuild() {
            error!(error = %e, "Rebuild failed");
        }
    }
}

/// Wait for the next event, then gather events until `debounce` passes
/// without one. Returns the changed paths, ignoring paths under `output`, or
/// `None` once the channel is closed or `running` is cleared while idle.
pub fn next_batch(
    rx: &Receiver<notify::Result<Event>>,
    debounce: Duration,
    output: &Path,
    running: &RwLock<bool>,
) -> Option<Vec<PathBuf>> {
    let poll = debounce.max(MIN_POLL_INTERVAL);
    let first = loop {
        if !*running.read() {
            return None;
        }
        match rx.recv_timeout(poll) {
            Ok(res) => break res,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => return None,
        }
    };

    let mut paths = Vec::new();
    collect_paths(first, output, &mut paths);

    loop {
        match rx.recv_timeout(debounce) {
            Ok(res) => collect_paths(res, output, &mut paths),
            Err(RecvTimeoutError::Timeout) => break,
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    paths.sort();
    paths.dedup();
    Some(paths)
}

fn collect_paths(res: notify::Result<Event>, output: &Path, paths: &mut Vec<PathBuf>) {
    match res {
        Ok(event) => {
            if event.kind.is_access() {
                return;
            }
            paths.extend(event.paths.into_iter().filter(|p| !p.starts_with(output)));
        }
        Err(e) => warn!(error = %e, "Watch error"),
    }
}
