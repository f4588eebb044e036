//! Unified diff generation

use super::hunk::parse_hunks;
use serde::Serialize;
use similar::TextDiff;
use std::fs;
use std::path::Path;

/// What kind of diff could be produced for a file pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DiffKind {
    /// Both sides are UTF-8 text
    Text,
    /// At least one side is not UTF-8; the file is replaced wholesale
    Binary,
    /// At least one side could not be read
    Unreadable,
}

/// Unified diff of one file pair with its line counts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDiff {
    /// Unified diff text; empty for binary and unreadable pairs
    pub text: String,
    pub added: usize,
    pub removed: usize,
    pub kind: DiffKind,
}

impl FileDiff {
    fn empty(kind: DiffKind) -> Self {
        Self {
            text: String::new(),
            added: 0,
            removed: 0,
            kind,
        }
    }

    pub fn is_binary(&self) -> bool {
        self.kind == DiffKind::Binary
    }

    pub fn total_changes(&self) -> usize {
        self.added + self.removed
    }
}

/// Diff two files on disk.
///
/// `name` is the relative path shown in the `a/<name>` and `b/<name>` headers.
/// Read failures are logged and reported as `DiffKind::Unreadable` so a batch of diffs
/// never aborts on one file.
pub fn diff_files(old_path: &Path, new_path: &Path, name: &str, context_lines: usize) -> FileDiff {
    let (old_bytes, new_bytes) = match (fs::read(old_path), fs::read(new_path)) {
        (Ok(old), Ok(new)) => (old, new),
        (Err(e), _) => {
            log::warn!("Cannot read {}: {}", old_path.display(), e);
            return FileDiff::empty(DiffKind::Unreadable);
        }
        (_, Err(e)) => {
            log::warn!("Cannot read {}: {}", new_path.display(), e);
            return FileDiff::empty(DiffKind::Unreadable);
        }
    };

    match (String::from_utf8(old_bytes), String::from_utf8(new_bytes)) {
        (Ok(old), Ok(new)) => diff_text(&old, &new, name, context_lines),
        _ => {
            log::debug!("{} is binary, skipping line diff", name);
            FileDiff::empty(DiffKind::Binary)
        }
    }
}

/// Diff two in-memory texts line by line.
///
/// Lines end at `\n` only. A lone `\r` stays part of the line content so the hunks
/// read back by `parse_hunks` and replayed by `apply_hunks` see the same lines.
pub fn diff_text(old: &str, new: &str, name: &str, context_lines: usize) -> FileDiff {
    let old_lines: Vec<&str> = old.split_inclusive('\n').collect();
    let new_lines: Vec<&str> = new.split_inclusive('\n').collect();
    let text_diff = TextDiff::configure().diff_slices(old_lines.as_slice(), new_lines.as_slice());

    let mut unified = text_diff.unified_diff();
    unified.context_radius(context_lines);

    let mut text = String::new();
    for hunk in unified.iter_hunks() {
        if text.is_empty() {
            text.push_str(&format!("--- a/{}\n+++ b/{}\n", name, name));
        }
        text.push_str(&format!("{}\n", hunk.header()));
        for change in hunk.iter_changes() {
            let value = change.value();
            text.push_str(&format!("{}{}", change.tag(), value));
            if !value.ends_with('\n') {
                text.push_str("\n\\ No newline at end of file\n");
            }
        }
    }

    let hunks = parse_hunks(&text);
    FileDiff {
        added: hunks.iter().map(|h| h.added()).sum(),
        removed: hunks.iter().map(|h| h.removed()).sum(),
        text,
        kind: DiffKind::Text,
    }
}
