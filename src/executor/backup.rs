//! Backup-before-overwrite
//!
//! Before an existing project file or folder is replaced, a sibling copy named
//! `<name><suffix>` (default `.backup`) is made. The first backup wins: once it exists
//! it is never replaced, so it always holds the content from before the first apply.

use crate::executor::copy::{copy_dir_recursive, copy_file_atomic};
use crate::types::SyncError;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Outcome of [`ensure_backup`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackupOutcome {
    /// Target did not exist; nothing to protect
    NotNeeded,
    /// A new backup was written
    Created(PathBuf),
    /// An earlier backup was found and kept
    Kept(PathBuf),
}

/// Sibling backup path for `target`
///
/// # Example
/// ```
/// use treesync::executor::backup::backup_path;
/// use std::path::{Path, PathBuf};
///
/// assert_eq!(
///     backup_path(Path::new("src/a.ts"), ".backup"),
///     PathBuf::from("src/a.ts.backup")
/// );
/// ```
pub fn backup_path(target: &Path, suffix: &str) -> PathBuf {
    let mut name = target
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(OsString::from(suffix));
    target.with_file_name(name)
}

/// Back up `target` unless it is missing or a backup already exists
pub fn ensure_backup(target: &Path, suffix: &str) -> Result<BackupOutcome, SyncError> {
    let metadata = match std::fs::symlink_metadata(target) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BackupOutcome::NotNeeded),
        Err(e) => return Err(SyncError::from_io(target, e)),
    };

    let backup = backup_path(target, suffix);
    if backup.exists() {
        log::debug!("Keeping existing backup {}", backup.display());
        return Ok(BackupOutcome::Kept(backup));
    }

    if metadata.is_dir() {
        copy_dir_recursive(target, &backup, &[])?;
    } else {
        copy_file_atomic(target, &backup)?;
    }
    log::info!("Backed up {} to {}", target.display(), backup.display());

    Ok(BackupOutcome::Created(backup))
}
