//! Incremental merge of an upstream tree and an appended tree
//!
//! The upstream tree is copied to the output verbatim, except for merge
//! targets, whose content is the upstream file with the files of a mapped
//! appended directory spliced in. Passthrough directories of the appended
//! tree are relocated into the output unchanged.

pub mod engine;
pub mod mapper;
pub mod materializer;
pub mod passthrough;
pub mod splice;

pub use engine::{MergeEngine, MergeOutcome, TreeRoots};
pub use mapper::Mappings;
pub use materializer::{MergeOptions, RebuildReport, Rebuilder};
pub use passthrough::PassthroughResolver;
