//! Core type definitions for treesync

mod change;
mod entry;
mod error;
mod tree;

pub use change::{ChangeSet, Statistics};
pub use entry::{normalize_relative, EntryKind, Fingerprint, ScanEntry};
pub use error::SyncError;
pub use tree::{ScanTree, SkippedEntry};
