//! Graft: incremental merging of two file trees
//!
//! Keeps an output tree equal to an upstream tree combined with an appended
//! tree, recomputing only the outputs affected by each change.

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod merge;
pub mod tree;
pub mod watch;
