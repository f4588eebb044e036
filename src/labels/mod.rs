//! Stable labels for classified changes
//!
//! Every actionable change gets a short handle (`F001`, `N001`, `U001`) that later
//! process invocations use to review or apply it. The registry is persisted inside
//! the tracking file, so a label always resolves to the path it was generated for.

pub mod preview;

use crate::types::{ChangeSet, SyncError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Kind of change a label refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LabelKind {
    /// New folder (`F###`)
    Folder,
    /// New file (`N###`)
    NewFile,
    /// Updated file (`U###`)
    Update,
}

impl LabelKind {
    pub fn prefix(self) -> char {
        match self {
            LabelKind::Folder => 'F',
            LabelKind::NewFile => 'N',
            LabelKind::Update => 'U',
        }
    }

    /// Kind implied by a label's prefix
    pub fn of_label(label: &str) -> Option<Self> {
        match label.chars().next()? {
            'F' => Some(LabelKind::Folder),
            'N' => Some(LabelKind::NewFile),
            'U' => Some(LabelKind::Update),
            _ => None,
        }
    }

    /// Subcommand that applies one label of this kind
    pub fn apply_command(self) -> &'static str {
        match self {
            LabelKind::Folder => "add-folder",
            LabelKind::NewFile => "add-file",
            LabelKind::Update => "apply-update",
        }
    }

    fn label(self, index: usize) -> String {
        format!("{}{:03}", self.prefix(), index)
    }
}

impl fmt::Display for LabelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LabelKind::Folder => "folder",
            LabelKind::NewFile => "file",
            LabelKind::Update => "update",
        };
        f.write_str(name)
    }
}

/// What a label resolves to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelTarget {
    pub label: String,
    pub kind: LabelKind,
    /// Relative path inside both project roots
    pub path: String,
}

/// Label → path maps, one per kind
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelRegistry {
    pub folders: BTreeMap<String, String>,
    pub files: BTreeMap<String, String>,
    pub updates: BTreeMap<String, String>,
}

impl LabelRegistry {
    fn map(&self, kind: LabelKind) -> &BTreeMap<String, String> {
        match kind {
            LabelKind::Folder => &self.folders,
            LabelKind::NewFile => &self.files,
            LabelKind::Update => &self.updates,
        }
    }

    /// Resolve a label to its target
    ///
    /// # Errors
    /// `SyncError::InvalidLabel` when the label is not in the registry
    pub fn lookup(&self, label: &str) -> Result<LabelTarget, SyncError> {
        let kind = LabelKind::of_label(label).ok_or_else(|| SyncError::invalid_label(label))?;
        let path = self
            .map(kind)
            .get(label)
            .ok_or_else(|| SyncError::invalid_label(label))?;

        Ok(LabelTarget {
            label: label.to_string(),
            kind,
            path: path.clone(),
        })
    }

    /// Targets of one kind, in label order
    pub fn labels_of(&self, kind: LabelKind) -> Vec<LabelTarget> {
        let mut targets: Vec<LabelTarget> = self
            .map(kind)
            .iter()
            .map(|(label, path)| LabelTarget {
                label: label.clone(),
                kind,
                path: path.clone(),
            })
            .collect();
        // Counters past 999 widen the label, so compare by length first.
        targets.sort_by(|a, b| (a.label.len(), &a.label).cmp(&(b.label.len(), &b.label)));
        targets
    }

    pub fn len(&self) -> usize {
        self.folders.len() + self.files.len() + self.updates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Assign labels to every actionable change.
///
/// Folders are numbered in path order. New files are grouped by parent directory
/// (directories in order, files in order inside each), so files that land together
/// get consecutive labels. Updates are numbered in path order. The result depends
/// only on the ChangeSet.
pub fn assign_labels(changes: &ChangeSet) -> LabelRegistry {
    let mut registry = LabelRegistry::default();

    for (index, folder) in changes.new_folders.iter().enumerate() {
        registry
            .folders
            .insert(LabelKind::Folder.label(index + 1), folder.clone());
    }

    let mut by_parent: BTreeMap<&str, Vec<&String>> = BTreeMap::new();
    for file in &changes.new_files {
        let parent = file.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("");
        by_parent.entry(parent).or_default().push(file);
    }
    let grouped = by_parent.into_values().flat_map(|mut files| {
        files.sort();
        files
    });
    for (index, file) in grouped.enumerate() {
        registry
            .files
            .insert(LabelKind::NewFile.label(index + 1), file.clone());
    }

    for (index, file) in changes.updated_files.iter().enumerate() {
        registry
            .updates
            .insert(LabelKind::Update.label(index + 1), file.clone());
    }

    registry
}
