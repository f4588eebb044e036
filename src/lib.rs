//! # treesync - Review-first directory-tree synchronization
//!
//! Compares a working project with a fresh export of the same project, labels every
//! difference (`F###` new folders, `N###` new files, `U###` updated files), lets a
//! reviewer accept or reject each change down to individual diff hunks, and copies
//! only what was accepted back into the project, keeping a backup of everything it
//! overwrites.

// Module declarations
pub mod classify;
pub mod commands;
pub mod config;
pub mod diff;
pub mod executor;
pub mod hash;
pub mod labels;
pub mod review;
pub mod scanner;
pub mod state;
pub mod types;
pub mod ui;

// Re-export commonly used types
pub use classify::classify;
pub use config::Config;
pub use labels::{assign_labels, LabelKind, LabelRegistry, LabelTarget};
pub use scanner::scan_tree;
pub use state::{DecisionStore, TrackingState};
pub use types::{ChangeSet, ScanTree, SyncError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
