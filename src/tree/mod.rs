//! Filesystem trees
//!
//! Snapshots of a directory, the differ that turns two snapshots into a
//! patch, and the primitive that places files into the output tree.

pub mod diff;
pub mod entry;
pub mod link;
pub mod path;
pub mod walker;

pub use diff::{calculate_patch, DiffState, PatchOperation};
pub use entry::{Entry, EntryKind, EntryOrigin, Snapshot};
pub use link::LinkMode;
