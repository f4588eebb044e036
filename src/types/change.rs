//! ChangeSet - Classification of every path across the old and new trees

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Disjoint buckets of relative paths produced by the classifier
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    /// Folders present only in the new tree
    pub new_folders: BTreeSet<String>,
    /// Files present only in the new tree
    pub new_files: BTreeSet<String>,
    /// Files present in both trees with different content
    pub updated_files: BTreeSet<String>,
    /// Folders present only in the old tree
    pub deleted_folders: BTreeSet<String>,
    /// Files present only in the old tree
    pub deleted_files: BTreeSet<String>,
    /// Files present in both trees with identical content
    pub identical_files: BTreeSet<String>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bucket counts, as persisted in the tracking file
    pub fn statistics(&self) -> Statistics {
        Statistics {
            new_folders: self.new_folders.len(),
            new_files: self.new_files.len(),
            updated_files: self.updated_files.len(),
            deleted_folders: self.deleted_folders.len(),
            deleted_files: self.deleted_files.len(),
            identical_files: self.identical_files.len(),
        }
    }

    /// True when nothing differs between the trees
    pub fn is_unchanged(&self) -> bool {
        self.new_folders.is_empty()
            && self.new_files.is_empty()
            && self.updated_files.is_empty()
            && self.deleted_folders.is_empty()
            && self.deleted_files.is_empty()
    }
}

/// Aggregate counts of a ChangeSet
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    pub new_folders: usize,
    pub new_files: usize,
    pub updated_files: usize,
    pub deleted_folders: usize,
    pub deleted_files: usize,
    pub identical_files: usize,
}

impl Statistics {
    /// Number of changes a reviewer can act on
    pub fn actionable(&self) -> usize {
        self.new_folders + self.new_files + self.updated_files
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_change_set_is_unchanged() {
        let mut changes = ChangeSet::new();
        assert!(changes.is_unchanged());

        changes.identical_files.insert("same.ts".to_string());
        assert!(changes.is_unchanged());

        changes.deleted_files.insert("gone.ts".to_string());
        assert!(!changes.is_unchanged());
    }

    #[test]
    fn test_statistics_counts_each_bucket() {
        let mut changes = ChangeSet::new();
        changes.new_folders.insert("ui".to_string());
        changes.new_files.insert("ui/a.ts".to_string());
        changes.new_files.insert("ui/b.ts".to_string());
        changes.updated_files.insert("app.ts".to_string());

        let stats = changes.statistics();
        assert_eq!(stats.new_folders, 1);
        assert_eq!(stats.new_files, 2);
        assert_eq!(stats.updated_files, 1);
        assert_eq!(stats.actionable(), 4);
    }

    #[test]
    fn test_statistics_serialize_with_snake_case_keys() {
        let stats = Statistics {
            identical_files: 3,
            ..Default::default()
        };
        let json = serde_json::to_string(&stats).expect("serialize stats");
        assert!(json.contains("\"identical_files\":3"));
        assert!(json.contains("\"deleted_folders\":0"));
    }
}
