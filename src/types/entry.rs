//! ScanEntry - A single folder or file found by the tree scanner

use serde::{Deserialize, Serialize};
use std::fmt;

/// BLAKE3 digest of a file's full byte content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(pub [u8; 32]);

impl Fingerprint {
    /// Lowercase hex rendering of the digest
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Whether an entry is a folder or a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Dir,
    File,
}

/// Represents one entry of a scanned project tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanEntry {
    /// Relative path from the scan root, always `/`-separated
    pub path: String,

    /// Folder or file
    pub kind: EntryKind,

    /// Content fingerprint (files only)
    pub fingerprint: Option<Fingerprint>,
}

impl ScanEntry {
    /// Create a folder entry
    pub fn dir(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::Dir,
            fingerprint: None,
        }
    }

    /// Create a file entry with its content fingerprint
    pub fn file(path: impl Into<String>, fingerprint: Fingerprint) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::File,
            fingerprint: Some(fingerprint),
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Dir
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }
}

/// Convert a relative filesystem path to the platform-independent `/` form.
pub fn normalize_relative(path: &std::path::Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
