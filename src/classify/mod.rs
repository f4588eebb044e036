//! Change classification between an old project and a new export

use crate::types::{ChangeSet, ScanTree};

/// Classify every path of two scanned trees
///
/// Folders and files are compared as separate sets, so a path that is a folder on one
/// side and a file on the other shows up twice: once as a folder-side creation or
/// deletion and once as a file-side creation or deletion. It is never an update.
///
/// # Example
/// ```
/// use treesync::classify::classify;
/// use treesync::types::{Fingerprint, ScanEntry, ScanTree};
/// use std::path::PathBuf;
///
/// let mut old = ScanTree::new(PathBuf::from("old"));
/// let mut new = ScanTree::new(PathBuf::from("new"));
/// old.insert(ScanEntry::file("a.ts", Fingerprint([1; 32])));
/// new.insert(ScanEntry::file("a.ts", Fingerprint([2; 32])));
/// new.insert(ScanEntry::file("b.ts", Fingerprint([3; 32])));
///
/// let changes = classify(&old, &new);
/// assert!(changes.updated_files.contains("a.ts"));
/// assert!(changes.new_files.contains("b.ts"));
/// ```
pub fn classify(old_tree: &ScanTree, new_tree: &ScanTree) -> ChangeSet {
    let mut changes = ChangeSet::new();

    for new_entry in new_tree.iter() {
        let old_entry = old_tree
            .get(&new_entry.path)
            .filter(|old| old.kind == new_entry.kind);

        match (new_entry.is_dir(), old_entry) {
            (true, None) => {
                changes.new_folders.insert(new_entry.path.clone());
            }
            (true, Some(_)) => {}
            (false, None) => {
                changes.new_files.insert(new_entry.path.clone());
            }
            (false, Some(old)) => {
                if old.fingerprint == new_entry.fingerprint {
                    changes.identical_files.insert(new_entry.path.clone());
                } else {
                    changes.updated_files.insert(new_entry.path.clone());
                }
            }
        }
    }

    for old_entry in old_tree.iter() {
        let survives = new_tree
            .get(&old_entry.path)
            .map(|new| new.kind == old_entry.kind)
            .unwrap_or(false);
        if survives {
            continue;
        }

        if old_entry.is_dir() {
            changes.deleted_folders.insert(old_entry.path.clone());
        } else {
            changes.deleted_files.insert(old_entry.path.clone());
        }
    }

    log::debug!(
        "Classified {} old / {} new entries: {:?}",
        old_tree.len(),
        new_tree.len(),
        changes.statistics()
    );

    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EntryKind, Fingerprint, ScanEntry};
    use std::collections::BTreeSet;
    use std::path::PathBuf;

    fn tree(entries: &[(&str, Option<u8>)]) -> ScanTree {
        let mut tree = ScanTree::new(PathBuf::from("/root"));
        for (path, content) in entries {
            match content {
                Some(byte) => tree.insert(ScanEntry::file(*path, Fingerprint([*byte; 32]))),
                None => tree.insert(ScanEntry::dir(*path)),
            }
        }
        tree
    }

    #[test]
    fn test_identical_trees_are_unchanged() {
        let old = tree(&[("src", None), ("src/a.ts", Some(1))]);
        let new = tree(&[("src", None), ("src/a.ts", Some(1))]);

        let changes = classify(&old, &new);
        assert!(changes.is_unchanged());
        assert_eq!(changes.identical_files.len(), 1);
    }

    #[test]
    fn test_every_bucket() {
        let old = tree(&[
            ("gone", None),
            ("gone/x.ts", Some(9)),
            ("same.ts", Some(1)),
            ("changed.ts", Some(2)),
        ]);
        let new = tree(&[
            ("fresh", None),
            ("fresh/y.ts", Some(7)),
            ("same.ts", Some(1)),
            ("changed.ts", Some(3)),
        ]);

        let changes = classify(&old, &new);
        let stats = changes.statistics();
        assert_eq!(stats.new_folders, 1);
        assert_eq!(stats.new_files, 1);
        assert_eq!(stats.updated_files, 1);
        assert_eq!(stats.deleted_folders, 1);
        assert_eq!(stats.deleted_files, 1);
        assert_eq!(stats.identical_files, 1);
        assert!(changes.new_files.contains("fresh/y.ts"));
        assert!(changes.deleted_files.contains("gone/x.ts"));
    }

    #[test]
    fn test_kind_conflict_is_delete_plus_create() {
        let old = tree(&[("thing", Some(1))]);
        let new = tree(&[("thing", None)]);

        let changes = classify(&old, &new);
        assert!(changes.deleted_files.contains("thing"));
        assert!(changes.new_folders.contains("thing"));
        assert!(changes.updated_files.is_empty());
    }

    #[test]
    fn test_every_kind_path_lands_in_exactly_one_bucket() {
        let old = tree(&[
            ("a", None),
            ("a/1.ts", Some(1)),
            ("b.ts", Some(2)),
            ("c", Some(3)),
            ("d.ts", Some(4)),
        ]);
        let new = tree(&[
            ("a", None),
            ("a/1.ts", Some(5)),
            ("b.ts", Some(2)),
            ("c", None),
            ("e", None),
            ("e/f.ts", Some(6)),
        ]);

        let changes = classify(&old, &new);

        let mut union: BTreeSet<(EntryKind, String)> = BTreeSet::new();
        for entry in old.iter().chain(new.iter()) {
            union.insert((entry.kind, entry.path.clone()));
        }

        for (kind, path) in &union {
            let buckets = match kind {
                EntryKind::Dir => vec![&changes.new_folders, &changes.deleted_folders],
                EntryKind::File => vec![
                    &changes.new_files,
                    &changes.updated_files,
                    &changes.deleted_files,
                    &changes.identical_files,
                ],
            };
            let hits = buckets.iter().filter(|b| b.contains(path)).count();
            let unchanged_dir = *kind == EntryKind::Dir
                && old.get(path).map(|e| e.is_dir()).unwrap_or(false)
                && new.get(path).map(|e| e.is_dir()).unwrap_or(false);
            let expected = if unchanged_dir { 0 } else { 1 };
            assert_eq!(hits, expected, "{:?} {} in {} buckets", kind, path, hits);
        }
    }
}
