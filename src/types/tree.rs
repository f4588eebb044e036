//! ScanTree - Result of scanning one project root

use super::{EntryKind, ScanEntry};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// An entry the scanner could not include
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEntry {
    /// Relative path (or absolute when no relative form exists)
    pub path: String,
    /// Human readable reason
    pub reason: String,
}

/// Scanned project tree
#[derive(Debug, Clone, PartialEq)]
pub struct ScanTree {
    /// Map: relative_path → ScanEntry, ordered by path
    pub entries: BTreeMap<String, ScanEntry>,

    /// Aggregate statistics
    pub total_files: usize,
    pub total_dirs: usize,

    /// Entries reported as non-fatal errors during the scan
    pub skipped: Vec<SkippedEntry>,

    /// Scan metadata
    pub scan_duration: Duration,
    pub root_path: PathBuf,
}

impl ScanTree {
    /// Create a new empty ScanTree
    pub fn new(root_path: PathBuf) -> Self {
        Self {
            entries: BTreeMap::new(),
            total_files: 0,
            total_dirs: 0,
            skipped: Vec::new(),
            scan_duration: Duration::from_secs(0),
            root_path,
        }
    }

    /// Insert an entry into the tree
    ///
    /// Updates the file/dir counters. If the path already exists the old entry is
    /// replaced and its counter adjusted.
    pub fn insert(&mut self, entry: ScanEntry) {
        if let Some(old) = self.entries.get(&entry.path) {
            match old.kind {
                EntryKind::Dir => self.total_dirs = self.total_dirs.saturating_sub(1),
                EntryKind::File => self.total_files = self.total_files.saturating_sub(1),
            }
        }

        match entry.kind {
            EntryKind::Dir => self.total_dirs += 1,
            EntryKind::File => self.total_files += 1,
        }
        self.entries.insert(entry.path.clone(), entry);
    }

    /// Record an entry that was left out of the scan
    pub fn skip(&mut self, path: impl Into<String>, reason: impl Into<String>) {
        self.skipped.push(SkippedEntry {
            path: path.into(),
            reason: reason.into(),
        });
    }

    /// Get an entry by relative path
    pub fn get(&self, path: &str) -> Option<&ScanEntry> {
        self.entries.get(path)
    }

    /// Check if a path exists in the tree
    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterator over all entries in path order
    pub fn iter(&self) -> impl Iterator<Item = &ScanEntry> {
        self.entries.values()
    }

    /// Folder entries only
    pub fn dirs(&self) -> impl Iterator<Item = &ScanEntry> {
        self.iter().filter(|e| e.is_dir())
    }

    /// File entries only
    pub fn files(&self) -> impl Iterator<Item = &ScanEntry> {
        self.iter().filter(|e| e.is_file())
    }

    /// Set the scan duration after scanning completes
    pub fn set_scan_duration(&mut self, duration: Duration) {
        self.scan_duration = duration;
    }
}
