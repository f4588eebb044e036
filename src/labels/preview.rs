//! Preview area: per-label artifacts written during analysis
//!
//! ```text
//! <output>/
//!   00_REPORTS/        sync_tracking.json, review_decisions.json, SUMMARY.md
//!   01_NEW_FOLDERS/    F###/<folder>          + README.md
//!   02_NEW_FILES/      N###/<name>, INFO.txt  + README.md
//!   03_UPDATED_FILES/  U###/changes.diff, file.OLD, file.NEW, SUMMARY.txt + README.md
//!   04_DELETED_ITEMS/  DELETED_ITEMS.md
//! ```

use super::{LabelKind, LabelTarget};
use crate::diff::{diff_files, FileDiff};
use crate::executor::copy::{copy_dir_recursive, copy_file_atomic, write_atomic};
use crate::types::{ChangeSet, Statistics, SyncError};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

/// Changes with more added + removed lines than this are flagged as major
const MAJOR_CHANGE_LINES: usize = 50;

/// Directory layout of the preview area
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewLayout {
    root: PathBuf,
}

impl PreviewLayout {
    pub const REPORTS_DIR: &'static str = "00_REPORTS";
    pub const FOLDERS_DIR: &'static str = "01_NEW_FOLDERS";
    pub const FILES_DIR: &'static str = "02_NEW_FILES";
    pub const UPDATES_DIR: &'static str = "03_UPDATED_FILES";
    pub const DELETED_DIR: &'static str = "04_DELETED_ITEMS";

    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn reports_dir(&self) -> PathBuf {
        self.root.join(Self::REPORTS_DIR)
    }

    pub fn tracking_file(&self) -> PathBuf {
        self.reports_dir().join("sync_tracking.json")
    }

    pub fn decisions_file(&self) -> PathBuf {
        self.reports_dir().join("review_decisions.json")
    }

    pub fn summary_report(&self) -> PathBuf {
        self.reports_dir().join("SUMMARY.md")
    }

    /// Shell script replaying the approved labels, written after a quick review
    pub fn apply_script(&self) -> PathBuf {
        self.root.join("apply_approved.sh")
    }

    pub fn deleted_dir(&self) -> PathBuf {
        self.root.join(Self::DELETED_DIR)
    }

    pub fn category_dir(&self, kind: LabelKind) -> PathBuf {
        let dir = match kind {
            LabelKind::Folder => Self::FOLDERS_DIR,
            LabelKind::NewFile => Self::FILES_DIR,
            LabelKind::Update => Self::UPDATES_DIR,
        };
        self.root.join(dir)
    }

    pub fn label_dir(&self, kind: LabelKind, label: &str) -> PathBuf {
        self.category_dir(kind).join(label)
    }

    pub fn update_artifacts(&self, label: &str) -> UpdateArtifacts {
        UpdateArtifacts {
            dir: self.label_dir(LabelKind::Update, label),
        }
    }

    /// Create the directory skeleton, clearing artifacts of a previous analysis.
    ///
    /// The reports directory is kept so an existing decision file survives.
    pub fn prepare(&self) -> Result<(), SyncError> {
        for kind in [LabelKind::Folder, LabelKind::NewFile, LabelKind::Update] {
            let dir = self.category_dir(kind);
            if dir.exists() {
                fs::remove_dir_all(&dir).map_err(|e| SyncError::from_io(&dir, e))?;
            }
        }
        let deleted = self.deleted_dir();
        if deleted.exists() {
            fs::remove_dir_all(&deleted).map_err(|e| SyncError::from_io(&deleted, e))?;
        }

        for dir in [
            self.reports_dir(),
            self.category_dir(LabelKind::Folder),
            self.category_dir(LabelKind::NewFile),
            self.category_dir(LabelKind::Update),
            self.deleted_dir(),
        ] {
            fs::create_dir_all(&dir).map_err(|e| SyncError::from_io(&dir, e))?;
        }
        Ok(())
    }
}

/// Fixed artifact names inside `03_UPDATED_FILES/U###/`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateArtifacts {
    dir: PathBuf,
}

impl UpdateArtifacts {
    pub const DIFF: &'static str = "changes.diff";
    pub const OLD: &'static str = "file.OLD";
    pub const NEW: &'static str = "file.NEW";
    pub const SUMMARY: &'static str = "SUMMARY.txt";
    pub const MERGED: &'static str = "partial.merged";

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn diff(&self) -> PathBuf {
        self.dir.join(Self::DIFF)
    }

    pub fn old(&self) -> PathBuf {
        self.dir.join(Self::OLD)
    }

    pub fn new_version(&self) -> PathBuf {
        self.dir.join(Self::NEW)
    }

    pub fn summary(&self) -> PathBuf {
        self.dir.join(Self::SUMMARY)
    }

    /// Old file with only the approved hunks of a partial review applied
    pub fn merged(&self) -> PathBuf {
        self.dir.join(Self::MERGED)
    }
}

/// One row of a category README
#[derive(Debug, Clone)]
pub struct IndexRow {
    pub label: String,
    pub path: String,
    pub detail: String,
}

/// Copy a new folder into `01_NEW_FOLDERS/F###/<folder>`; returns the file count
pub fn write_folder_preview(
    layout: &PreviewLayout,
    target: &LabelTarget,
    new_root: &Path,
    ignore_dirs: &[String],
) -> Result<u64, SyncError> {
    let dest = layout.label_dir(target.kind, &target.label).join(&target.path);
    copy_dir_recursive(&new_root.join(&target.path), &dest, ignore_dirs)
}

/// Copy a new file into `02_NEW_FILES/N###/` with an `INFO.txt`; returns its size
pub fn write_file_preview(
    layout: &PreviewLayout,
    target: &LabelTarget,
    old_root: &Path,
    new_root: &Path,
) -> Result<u64, SyncError> {
    let src = new_root.join(&target.path);
    let label_dir = layout.label_dir(target.kind, &target.label);
    let file_name = Path::new(&target.path)
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| target.path.clone().into());

    let size = copy_file_atomic(&src, &label_dir.join(file_name))?;

    let info = format!(
        "Original Path: {}\nFile Type: {}\nSize: {} bytes\nWill be copied to: {}\n",
        target.path,
        extension_of(&target.path),
        size,
        old_root.join(&target.path).display()
    );
    write_atomic(&label_dir.join("INFO.txt"), info.as_bytes())?;

    Ok(size)
}

/// Write the diff, both versions and a summary into `03_UPDATED_FILES/U###/`
pub fn write_update_preview(
    layout: &PreviewLayout,
    target: &LabelTarget,
    old_root: &Path,
    new_root: &Path,
    context_lines: usize,
) -> Result<FileDiff, SyncError> {
    let artifacts = layout.update_artifacts(&target.label);
    let old_path = old_root.join(&target.path);
    let new_path = new_root.join(&target.path);

    let diff = diff_files(&old_path, &new_path, &target.path, context_lines);

    write_atomic(&artifacts.diff(), diff.text.as_bytes())?;
    copy_file_atomic(&old_path, &artifacts.old())?;
    copy_file_atomic(&new_path, &artifacts.new_version())?;

    let summary = format!(
        "File: {}\nLines Added: {}\nLines Removed: {}\nTotal Changes: {}\nBinary: {}\n\n\
         To review: treesync review {}\nTo apply: treesync apply-update {}\nTo view: treesync view-diff {}\n",
        target.path,
        diff.added,
        diff.removed,
        diff.total_changes(),
        if diff.is_binary() { "yes" } else { "no" },
        target.label,
        target.label,
        target.label
    );
    write_atomic(&artifacts.summary(), summary.as_bytes())?;

    Ok(diff)
}

/// Detail column for an update row
pub fn update_detail(diff: &FileDiff) -> String {
    if diff.is_binary() {
        return "binary".to_string();
    }
    let status = if diff.total_changes() > MAJOR_CHANGE_LINES {
        "major"
    } else {
        "minor"
    };
    format!("+{} / -{} ({})", diff.added, diff.removed, status)
}

/// Write the `README.md` index of one category
pub fn write_category_index(
    layout: &PreviewLayout,
    kind: LabelKind,
    rows: &[IndexRow],
) -> Result<(), SyncError> {
    let (title, command, detail_header) = match kind {
        LabelKind::Folder => ("New Folders", "add-folder", "Files Inside"),
        LabelKind::NewFile => ("New Files", "add-file", "Size"),
        LabelKind::Update => ("Updated Files", "apply-update", "Changes"),
    };

    let mut out = String::new();
    let _ = writeln!(out, "# {}\n", title);
    let _ = writeln!(out, "Use `treesync {} <LABEL>` to take one into the project.", command);
    if kind == LabelKind::Update {
        let _ = writeln!(out, "Use `treesync review <LABEL>` to review it hunk by hunk.");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "| Label | Path | {} |", detail_header);
    let _ = writeln!(out, "|-------|------|------|");
    for row in rows {
        let _ = writeln!(out, "| **{}** | `{}` | {} |", row.label, row.path, row.detail);
    }

    write_atomic(&layout.category_dir(kind).join("README.md"), out.as_bytes())
}

/// List deletions in `04_DELETED_ITEMS/DELETED_ITEMS.md`. Deletions are informational only.
pub fn write_deleted_items(layout: &PreviewLayout, changes: &ChangeSet) -> Result<(), SyncError> {
    let mut out = String::from("# Items Removed in the New Export\n\n");
    out.push_str("These items exist in the project but not in the new export. Nothing is deleted automatically.\n");

    if !changes.deleted_folders.is_empty() {
        out.push_str("\n## Deleted Folders\n\n");
        for folder in &changes.deleted_folders {
            let _ = writeln!(out, "- `{}`", folder);
        }
    }
    if !changes.deleted_files.is_empty() {
        out.push_str("\n## Deleted Files\n\n");
        for file in &changes.deleted_files {
            let _ = writeln!(out, "- `{}`", file);
        }
    }

    write_atomic(&layout.deleted_dir().join("DELETED_ITEMS.md"), out.as_bytes())
}

/// Human-readable `00_REPORTS/SUMMARY.md`
pub fn write_summary_report(
    layout: &PreviewLayout,
    stats: &Statistics,
    generated: &str,
) -> Result<(), SyncError> {
    let mut out = String::from("# Sync Summary Report\n\n");
    let _ = writeln!(out, "Generated: {}\n", generated);
    out.push_str("## Statistics\n\n");
    let _ = writeln!(out, "- **New Folders:** {}", stats.new_folders);
    let _ = writeln!(out, "- **New Files:** {}", stats.new_files);
    let _ = writeln!(out, "- **Updated Files:** {}", stats.updated_files);
    let _ = writeln!(out, "- **Deleted Folders:** {}", stats.deleted_folders);
    let _ = writeln!(out, "- **Deleted Files:** {}", stats.deleted_files);
    let _ = writeln!(out, "- **Unchanged Files:** {}\n", stats.identical_files);
    out.push_str("## Quick Commands\n\n```bash\n");
    out.push_str("treesync list\n");
    out.push_str("treesync review U001\n");
    out.push_str("treesync quick\n");
    out.push_str("treesync apply\n");
    out.push_str("```\n");

    write_atomic(&layout.summary_report(), out.as_bytes())
}

fn extension_of(path: &str) -> String {
    Path::new(path)
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default()
}
