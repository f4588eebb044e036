//! Sequential directory walker

use crate::config::Config;
use crate::hash::compute_fingerprint;
use crate::types::{normalize_relative, ScanEntry, ScanTree, SyncError};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::collections::HashSet;
use std::path::Path;
use std::time::Instant;

/// Callback for reporting scan progress
///
/// Arguments:
/// - `files_scanned`: Total number of files fingerprinted so far
/// - `dirs_scanned`: Total number of folders seen so far
pub type ProgressCallback = Box<dyn Fn(u64, u64) + Send + Sync>;

/// Scan a project root and build a ScanTree
///
/// Walks the directory tree recursively with the `ignore` crate. Directories whose
/// name is in `config.ignore_dirs` are pruned before descent, so dependency caches
/// and build output are never visited. Every file is fingerprinted by content.
///
/// # Errors
/// * A missing or non-directory root returns `SyncError::Config`
/// * Invalid exclude patterns return `SyncError::Config`
/// * Unreadable files, broken symlinks and traversal errors are logged, recorded in
///   `ScanTree::skipped`, and do not stop the scan
pub fn scan_tree(
    root_path: &Path,
    config: &Config,
    on_progress: Option<&ProgressCallback>,
) -> Result<ScanTree, SyncError> {
    if !root_path.is_dir() {
        return Err(SyncError::Config(format!(
            "Scan root is not a directory: {}",
            root_path.display()
        )));
    }

    let start_time = Instant::now();
    let mut tree = ScanTree::new(root_path.to_path_buf());
    let excluded = compile_patterns(&config.exclude_patterns)?;

    let mut scanned_files: u64 = 0;
    let mut scanned_dirs: u64 = 0;

    let ignore_dirs: HashSet<String> = config.ignore_dirs.iter().cloned().collect();
    let walker = ignore::WalkBuilder::new(root_path)
        .standard_filters(false) // the export's .gitignore must not hide changes
        .follow_links(false)
        .sort_by_file_name(|a, b| a.cmp(b))
        .filter_entry(move |entry| {
            let is_dir = entry.file_type().map(|ft| ft.is_dir()).unwrap_or(false);
            !(is_dir
                && entry.depth() > 0
                && ignore_dirs.contains(entry.file_name().to_string_lossy().as_ref()))
        })
        .build();

    // Last folder entered; stands in for traversal errors that carry no path
    let mut current_dir = String::from(".");

    for result in walker {
        let entry = match result {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Error during directory traversal: {}. Scan continues.", e);
                let path = error_path(&e)
                    .map(|p| relative_or_full(p, root_path))
                    .unwrap_or_else(|| current_dir.clone());
                tree.skip(path, e.to_string());
                continue;
            }
        };

        if entry.depth() == 0 {
            continue;
        }

        let file_type = match entry.file_type() {
            Some(ft) => ft,
            None => continue, // stdin entries only
        };

        let relative_path = match entry.path().strip_prefix(root_path) {
            Ok(p) => normalize_relative(p),
            Err(_) => {
                log::warn!(
                    "Cannot compute relative path for {}; skipping",
                    entry.path().display()
                );
                continue;
            }
        };

        if file_type.is_dir() {
            current_dir.clone_from(&relative_path);
            tree.insert(ScanEntry::dir(relative_path));
            scanned_dirs += 1;
            continue;
        }

        let file_name = entry.file_name().to_string_lossy();
        if config.skip_hidden_files && file_name.starts_with('.') {
            continue;
        }
        if excluded.is_match(file_name.as_ref()) || excluded.is_match(&relative_path) {
            continue;
        }

        // Regular files, symlinks and special files are all read by content. Anything
        // that cannot be read (broken link, link to a folder, fifo, permissions) is skipped.
        match compute_fingerprint(entry.path()) {
            Ok(fingerprint) => {
                tree.insert(ScanEntry::file(relative_path, fingerprint));
                scanned_files += 1;
            }
            Err(e) => {
                log::warn!("Error reading {}: {}", entry.path().display(), e);
                tree.skip(relative_path, e.to_string());
                continue;
            }
        }

        if let Some(callback) = on_progress {
            callback(scanned_files, scanned_dirs);
        }
    }

    tree.set_scan_duration(start_time.elapsed());
    log::debug!(
        "Scanned {}: {} files, {} folders, {} skipped in {:?}",
        root_path.display(),
        tree.total_files,
        tree.total_dirs,
        tree.skipped.len(),
        tree.scan_duration
    );

    Ok(tree)
}

pub(crate) fn compile_patterns(patterns: &[String]) -> Result<GlobSet, SyncError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| {
            SyncError::Config(format!("Invalid exclude pattern '{}': {}", pattern, e))
        })?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| SyncError::Config(format!("Failed to build exclude patterns: {}", e)))
}

/// Path carried by a traversal error, looking through depth and line wrappers
fn error_path(err: &ignore::Error) -> Option<&Path> {
    match err {
        ignore::Error::WithPath { path, .. } => Some(path.as_path()),
        ignore::Error::Loop { child, .. } => Some(child.as_path()),
        ignore::Error::WithDepth { err, .. } | ignore::Error::WithLineNumber { err, .. } => {
            error_path(err)
        }
        ignore::Error::Partial(errs) => errs.iter().find_map(error_path),
        _ => None,
    }
}

fn relative_or_full(path: &Path, root_path: &Path) -> String {
    match path.strip_prefix(root_path) {
        Ok(relative) if relative.as_os_str().is_empty() => ".".to_string(),
        Ok(relative) => normalize_relative(relative),
        Err(_) => path.display().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_scan_empty_directory() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let tree = scan_tree(temp_dir.path(), &Config::default(), None)
            .expect("scan_tree should succeed on empty dir");

        assert!(tree.is_empty());
        assert_eq!(tree.total_files, 0);
        assert_eq!(tree.root_path, temp_dir.path());
    }

    #[test]
    fn test_scan_missing_root_is_config_error() {
        let result = scan_tree(Path::new("/nonexistent/root"), &Config::default(), None);
        assert!(matches!(result, Err(SyncError::Config(_))));
    }

    #[test]
    fn test_scan_nested_directories() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let root = temp_dir.path();

        fs::create_dir_all(root.join("a/b")).expect("Failed to create dirs");
        fs::create_dir(root.join("c")).expect("Failed to create dir");
        fs::write(root.join("a/b/file.txt"), "File 1").expect("Failed to write");
        fs::write(root.join("c/file2.txt"), "File 2 content").expect("Failed to write");

        let tree = scan_tree(root, &Config::default(), None).expect("scan_tree should succeed");

        assert_eq!(tree.total_files, 2);
        assert_eq!(tree.total_dirs, 3);
        assert!(tree.get("a").map(|e| e.is_dir()).unwrap_or(false));
        assert!(tree.get("a/b").map(|e| e.is_dir()).unwrap_or(false));
        assert!(tree.get("a/b/file.txt").map(|e| e.is_file()).unwrap_or(false));
        assert!(tree.contains("c/file2.txt"));
    }

    #[test]
    fn test_ignored_directories_are_pruned() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let root = temp_dir.path();

        fs::create_dir_all(root.join("node_modules/react")).expect("create node_modules");
        fs::write(root.join("node_modules/react/index.js"), "x").expect("write dep");
        fs::create_dir_all(root.join("src/dist")).expect("create nested dist");
        fs::write(root.join("src/dist/out.js"), "x").expect("write build output");
        fs::write(root.join("src/app.ts"), "app").expect("write app");

        let tree = scan_tree(root, &Config::default(), None).expect("scan_tree should succeed");

        assert!(tree.contains("src/app.ts"));
        assert!(tree.iter().all(|e| !e.path.contains("node_modules")));
        assert!(tree.iter().all(|e| !e.path.contains("dist")));
    }

    #[test]
    fn test_hidden_and_excluded_files_are_skipped() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let root = temp_dir.path();

        fs::write(root.join(".env"), "SECRET=1").expect("write hidden");
        fs::write(root.join("debug.log"), "log").expect("write log");
        fs::write(root.join("cache.pyc"), "pyc").expect("write pyc");
        fs::write(root.join("keep.ts"), "keep").expect("write keep");

        let tree = scan_tree(root, &Config::default(), None).expect("scan_tree should succeed");

        assert_eq!(tree.total_files, 1);
        assert!(tree.contains("keep.ts"));
        assert!(tree.skipped.is_empty(), "filtered files are not errors");
    }

    #[test]
    fn test_hidden_files_kept_when_configured() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        fs::write(temp_dir.path().join(".env"), "SECRET=1").expect("write hidden");

        let config = Config {
            skip_hidden_files: false,
            ..Config::default()
        };
        let tree = scan_tree(temp_dir.path(), &config, None).expect("scan_tree should succeed");
        assert!(tree.contains(".env"));
    }

    #[test]
    fn test_invalid_pattern_is_config_error() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config = Config {
            exclude_patterns: vec!["[".to_string()],
            ..Config::default()
        };
        let result = scan_tree(temp_dir.path(), &config, None);
        assert!(matches!(result, Err(SyncError::Config(_))));
    }

    #[test]
    fn test_identical_content_yields_identical_fingerprint() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let root = temp_dir.path();
        fs::write(root.join("one.ts"), "same").expect("write one");
        fs::write(root.join("two.ts"), "same").expect("write two");

        let tree = scan_tree(root, &Config::default(), None).expect("scan_tree should succeed");
        assert_eq!(
            tree.get("one.ts").and_then(|e| e.fingerprint),
            tree.get("two.ts").and_then(|e| e.fingerprint)
        );
    }

    #[test]
    #[cfg(unix)]
    fn test_scan_symlink_is_read_by_content() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let root = temp_dir.path();
        fs::write(root.join("target.txt"), "Target content").expect("write target");
        std::os::unix::fs::symlink(root.join("target.txt"), root.join("link.txt"))
            .expect("Failed to create symlink");

        let tree = scan_tree(root, &Config::default(), None).expect("scan_tree should succeed");

        let link = tree.get("link.txt").expect("symlink entry should exist");
        assert!(link.is_file());
        assert_eq!(link.fingerprint, tree.get("target.txt").and_then(|e| e.fingerprint));
    }

    #[test]
    #[cfg(unix)]
    fn test_scan_broken_symlink_is_skipped_with_record() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let root = temp_dir.path();
        std::os::unix::fs::symlink(root.join("nonexistent.txt"), root.join("broken.txt"))
            .expect("Failed to create symlink");
        fs::write(root.join("ok.txt"), "ok").expect("write ok");

        let tree = scan_tree(root, &Config::default(), None)
            .expect("scan_tree should handle broken symlinks gracefully");

        assert!(!tree.contains("broken.txt"));
        assert!(tree.contains("ok.txt"));
        assert_eq!(tree.skipped.len(), 1);
        assert_eq!(tree.skipped[0].path, "broken.txt");
    }

    #[test]
    fn test_scan_progress_callback() {
        use std::sync::atomic::{AtomicU64, Ordering};
        use std::sync::Arc;

        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        for i in 1..=5 {
            fs::write(temp_dir.path().join(format!("file{}.txt", i)), format!("content {}", i))
                .expect("write file");
        }

        let call_count = Arc::new(AtomicU64::new(0));
        let call_count_clone = Arc::clone(&call_count);
        let callback: ProgressCallback = Box::new(move |files, _dirs| {
            call_count_clone.fetch_add(1, Ordering::SeqCst);
            assert!(files > 0, "File count should be positive");
        });

        let tree = scan_tree(temp_dir.path(), &Config::default(), Some(&callback))
            .expect("scan_tree should succeed");

        assert_eq!(call_count.load(Ordering::SeqCst), 5);
        assert_eq!(tree.total_files, 5);
    }

    #[test]
    fn test_traversal_error_keeps_its_path() {
        let root = Path::new("/projects/old");
        let err = ignore::Error::WithDepth {
            depth: 2,
            err: Box::new(ignore::Error::WithPath {
                path: root.join("src/locked"),
                err: Box::new(ignore::Error::Io(std::io::Error::from(
                    std::io::ErrorKind::PermissionDenied,
                ))),
            }),
        };

        let path = error_path(&err).map(|p| relative_or_full(p, root));
        assert_eq!(path.as_deref(), Some("src/locked"));
    }

    #[test]
    fn test_traversal_error_without_path() {
        let err = ignore::Error::Io(std::io::Error::from(std::io::ErrorKind::Other));
        assert!(error_path(&err).is_none());
        assert_eq!(relative_or_full(Path::new("/elsewhere/x"), Path::new("/projects")), "/elsewhere/x");
        assert_eq!(relative_or_full(Path::new("/projects"), Path::new("/projects")), ".");
    }
}
