//! Atomic file and folder copies

use crate::types::SyncError;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// Sibling temp path: `name.ext` → `name.ext.part`
fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| OsString::from("unnamed"));
    name.push(".part");
    dest.with_file_name(name)
}

/// Copy a file atomically using the write-then-rename strategy
///
/// 1. Write to a sibling `.part` file
/// 2. Flush and sync to disk
/// 3. Preserve metadata (permissions, mtime)
/// 4. Rename over the destination
///
/// The destination is either untouched or fully replaced; a reader never sees a
/// half-written file.
///
/// # Returns
/// * `Ok(u64)` - Number of bytes copied
///
/// # Example
/// ```no_run
/// use treesync::executor::copy_file_atomic;
/// use std::path::Path;
///
/// let bytes = copy_file_atomic(Path::new("source.txt"), Path::new("dest.txt"))?;
/// # Ok::<(), treesync::types::SyncError>(())
/// ```
pub fn copy_file_atomic(src: &Path, dest: &Path) -> Result<u64, SyncError> {
    // ═══════════════════════════════════════════════════════════
    // STEP 1: Prepare - Create parent directories and .part path
    // ═══════════════════════════════════════════════════════════
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(|e| SyncError::from_io(parent, e))?;
    }

    let part_path = part_path(dest);

    // ═══════════════════════════════════════════════════════════
    // STEP 2: Copy - Stream from src to .part file
    // ═══════════════════════════════════════════════════════════
    let mut src_file = File::open(src).map_err(|e| SyncError::from_io(src, e))?;
    let mut part_file = File::create(&part_path).map_err(|e| SyncError::from_io(&part_path, e))?;

    let mut buffer = vec![0u8; 128 * 1024];
    let mut total_bytes = 0u64;

    loop {
        let bytes_read = src_file
            .read(&mut buffer)
            .map_err(|e| SyncError::from_io(src, e))?;

        if bytes_read == 0 {
            break;
        }

        part_file
            .write_all(&buffer[0..bytes_read])
            .map_err(|e| SyncError::from_io(&part_path, e))?;
        total_bytes += bytes_read as u64;
    }

    // ═══════════════════════════════════════════════════════════
    // STEP 3: Flush - Force OS to write data to physical disk
    // ═══════════════════════════════════════════════════════════
    part_file
        .sync_all()
        .map_err(|e| SyncError::from_io(&part_path, e))?;

    // Drop the file handle before rename (required on Windows)
    drop(part_file);

    // ═══════════════════════════════════════════════════════════
    // STEP 4: Metadata - Preserve permissions and mtime
    // ═══════════════════════════════════════════════════════════
    let src_metadata = fs::metadata(src).map_err(|e| SyncError::from_io(src, e))?;
    fs::set_permissions(&part_path, src_metadata.permissions())
        .map_err(|e| SyncError::from_io(&part_path, e))?;

    let mtime = src_metadata.modified()?;
    filetime::set_file_mtime(&part_path, filetime::FileTime::from_system_time(mtime))
        .map_err(|e| SyncError::from_io(&part_path, e))?;

    // ═══════════════════════════════════════════════════════════
    // STEP 5: Commit - Rename to final destination
    // ═══════════════════════════════════════════════════════════
    fs::rename(&part_path, dest).map_err(|e| SyncError::from_io(dest, e))?;

    Ok(total_bytes)
}

/// Write bytes to `dest` through a `.part` file and rename
pub fn write_atomic(dest: &Path, contents: &[u8]) -> Result<(), SyncError> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(|e| SyncError::from_io(parent, e))?;
    }

    let part_path = part_path(dest);
    let mut part_file = File::create(&part_path).map_err(|e| SyncError::from_io(&part_path, e))?;
    part_file
        .write_all(contents)
        .and_then(|_| part_file.sync_all())
        .map_err(|e| SyncError::from_io(&part_path, e))?;
    drop(part_file);

    fs::rename(&part_path, dest).map_err(|e| SyncError::from_io(dest, e))
}

/// Recursively copy a folder, skipping sub-folders named in `ignore_dirs`
///
/// Returns the number of files copied. Each file goes through
/// [`copy_file_atomic`]; the first failure stops the copy.
pub fn copy_dir_recursive(src: &Path, dest: &Path, ignore_dirs: &[String]) -> Result<u64, SyncError> {
    fs::create_dir_all(dest).map_err(|e| SyncError::from_io(dest, e))?;

    let mut entries: Vec<fs::DirEntry> = fs::read_dir(src)
        .map_err(|e| SyncError::from_io(src, e))?
        .collect::<Result<_, _>>()
        .map_err(|e| SyncError::from_io(src, e))?;
    entries.sort_by_key(|e| e.file_name());

    let mut copied = 0u64;
    for entry in entries {
        let name = entry.file_name();
        let src_path = entry.path();
        let dest_path = dest.join(&name);

        let file_type = entry
            .file_type()
            .map_err(|e| SyncError::from_io(&src_path, e))?;

        if file_type.is_dir() {
            if ignore_dirs.iter().any(|d| name.to_str() == Some(d.as_str())) {
                continue;
            }
            copied += copy_dir_recursive(&src_path, &dest_path, ignore_dirs)?;
        } else {
            copy_file_atomic(&src_path, &dest_path)?;
            copied += 1;
        }
    }

    Ok(copied)
}
