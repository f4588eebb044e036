//! Hashing utilities

use crate::types::{Fingerprint, SyncError};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Compute the BLAKE3 fingerprint of a file
///
/// The file is streamed in 64KB chunks, so large assets never have to fit in memory.
/// Symlinks are followed: the fingerprint is that of the content they point to.
///
/// # Example
/// ```no_run
/// use treesync::hash::compute_fingerprint;
/// use std::path::Path;
///
/// let fp = compute_fingerprint(Path::new("file.txt"))?;
/// println!("{}", fp);
/// # Ok::<(), treesync::types::SyncError>(())
/// ```
pub fn compute_fingerprint(file_path: &Path) -> Result<Fingerprint, SyncError> {
    let mut file = File::open(file_path).map_err(|e| SyncError::from_io(file_path, e))?;
    let mut hasher = blake3::Hasher::new();
    let mut buffer = vec![0u8; 64 * 1024];

    loop {
        let bytes_read = file
            .read(&mut buffer)
            .map_err(|e| SyncError::from_io(file_path, e))?;

        if bytes_read == 0 {
            break;
        }

        hasher.update(&buffer[0..bytes_read]);
    }

    Ok(Fingerprint(*hasher.finalize().as_bytes()))
}

/// Fingerprint of an in-memory buffer
pub fn fingerprint_bytes(bytes: &[u8]) -> Fingerprint {
    Fingerprint(*blake3::hash(bytes).as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn temp_with(content: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_hash_empty_file() {
        let file = temp_with(b"");
        let fp = compute_fingerprint(file.path()).unwrap();
        assert_eq!(fp, fingerprint_bytes(b""));
    }

    #[test]
    fn test_hash_deterministic() {
        let file1 = temp_with(b"Test content for hashing");
        let file2 = temp_with(b"Test content for hashing");

        assert_eq!(
            compute_fingerprint(file1.path()).unwrap(),
            compute_fingerprint(file2.path()).unwrap()
        );
    }

    #[test]
    fn test_hash_different_content() {
        let file1 = temp_with(b"Content A");
        let file2 = temp_with(b"Content B");

        assert_ne!(
            compute_fingerprint(file1.path()).unwrap(),
            compute_fingerprint(file2.path()).unwrap()
        );
    }

    #[test]
    fn test_streamed_hash_matches_buffer_hash_across_chunks() {
        let content = vec![0x5au8; 64 * 1024 * 2 + 17];
        let file = temp_with(&content);
        assert_eq!(
            compute_fingerprint(file.path()).unwrap(),
            fingerprint_bytes(&content)
        );
    }

    #[test]
    fn test_hash_nonexistent_file() {
        let result = compute_fingerprint(Path::new("/nonexistent/file.txt"));
        assert!(result.is_err());
    }
}
