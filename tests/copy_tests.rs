//! Tests for atomic copies and pre-overwrite backups

use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};
use tempfile::TempDir;
use treesync::executor::{backup_path, copy_dir_recursive, copy_file_atomic, ensure_backup, BackupOutcome};

fn create_test_file(path: &Path, content: &[u8]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create parent dir");
    }
    fs::write(path, content).expect("Failed to write test file");
}

#[test]
fn test_copy_creates_directories() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let root = temp_dir.path();

    let src_path = root.join("source.txt");
    create_test_file(&src_path, b"test content");

    let dest_path = root.join("a/b/c/dest.txt");
    let bytes_copied = copy_file_atomic(&src_path, &dest_path).expect("copy_file_atomic should succeed");

    assert_eq!(bytes_copied, 12);
    assert_eq!(fs::read(&dest_path).expect("Failed to read dest file"), b"test content");
}

#[test]
fn test_copy_preserves_mtime() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let root = temp_dir.path();

    let src_path = root.join("source.txt");
    create_test_file(&src_path, b"test content");

    let mtime = SystemTime::now() - Duration::from_secs(3600);
    filetime::set_file_mtime(&src_path, filetime::FileTime::from_system_time(mtime))
        .expect("Failed to set mtime");

    let dest_path = root.join("dest.txt");
    copy_file_atomic(&src_path, &dest_path).expect("copy_file_atomic should succeed");

    let src_mtime = fs::metadata(&src_path).and_then(|m| m.modified()).expect("src mtime");
    let dest_mtime = fs::metadata(&dest_path).and_then(|m| m.modified()).expect("dest mtime");
    let diff = if src_mtime > dest_mtime {
        src_mtime.duration_since(dest_mtime).unwrap()
    } else {
        dest_mtime.duration_since(src_mtime).unwrap()
    };

    assert!(
        diff < Duration::from_secs(2),
        "mtime should be preserved (diff: {:?})",
        diff
    );
}

#[test]
fn test_copy_leaves_no_part_file() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let root = temp_dir.path();

    let src_path = root.join("source.tsx");
    create_test_file(&src_path, b"export {}");

    let dest_path = root.join("dest.tsx");
    copy_file_atomic(&src_path, &dest_path).expect("copy_file_atomic should succeed");

    assert!(!root.join("dest.tsx.part").exists());
    assert!(!root.join("dest.part").exists());
    assert!(dest_path.exists());
}

#[test]
fn test_copy_overwrites_existing_destination() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let root = temp_dir.path();

    let src_path = root.join("new.txt");
    let dest_path = root.join("old.txt");
    create_test_file(&src_path, b"new");
    create_test_file(&dest_path, b"old and longer");

    copy_file_atomic(&src_path, &dest_path).expect("copy_file_atomic should succeed");
    assert_eq!(fs::read(&dest_path).expect("read dest"), b"new");
}

#[test]
fn test_copy_preserves_permissions() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let root = temp_dir.path();

    let src_path = root.join("source.sh");
    create_test_file(&src_path, b"#!/bin/sh\n");

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&src_path, fs::Permissions::from_mode(0o755))
            .expect("Failed to set permissions");
    }

    let dest_path = root.join("dest.sh");
    copy_file_atomic(&src_path, &dest_path).expect("copy_file_atomic should succeed");

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = fs::metadata(&dest_path).expect("dest metadata").permissions().mode();
        assert_eq!(mode & 0o777, 0o755, "Permissions should be preserved");
    }
}

#[test]
fn test_copy_dir_skips_ignored_dirs() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let root = temp_dir.path();

    create_test_file(&root.join("src/ui/button.tsx"), b"button");
    create_test_file(&root.join("src/ui/icons/star.svg"), b"<svg/>");
    create_test_file(&root.join("src/node_modules/pkg/index.js"), b"dep");

    let files = copy_dir_recursive(&root.join("src"), &root.join("copy"), &["node_modules".to_string()])
        .expect("copy_dir_recursive should succeed");

    assert_eq!(files, 2);
    assert!(root.join("copy/ui/icons/star.svg").is_file());
    assert!(!root.join("copy/node_modules").exists());
}

#[test]
fn test_first_backup_is_never_replaced() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let target = temp_dir.path().join("a.ts");
    create_test_file(&target, b"X");

    let first = ensure_backup(&target, ".backup").expect("first backup");
    let backup = backup_path(&target, ".backup");
    assert_eq!(first, BackupOutcome::Created(backup.clone()));

    fs::write(&target, b"Y").expect("overwrite target");
    let second = ensure_backup(&target, ".backup").expect("second backup");

    assert_eq!(second, BackupOutcome::Kept(backup.clone()));
    assert_eq!(fs::read(&backup).expect("read backup"), b"X");
}

#[test]
fn test_backup_of_missing_target_is_not_needed() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let outcome = ensure_backup(&temp_dir.path().join("nope.ts"), ".backup").expect("backup");
    assert_eq!(outcome, BackupOutcome::NotNeeded);
}

#[test]
fn test_backup_of_folder_copies_tree() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let folder = temp_dir.path().join("components");
    create_test_file(&folder.join("ui/button.tsx"), b"button");

    let outcome = ensure_backup(&folder, ".orig").expect("folder backup");
    let backup = temp_dir.path().join("components.orig");

    assert_eq!(outcome, BackupOutcome::Created(backup.clone()));
    assert_eq!(fs::read(backup.join("ui/button.tsx")).expect("read backup"), b"button");
}
