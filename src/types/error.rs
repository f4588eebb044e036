//! Error types for treesync

use std::path::PathBuf;
use thiserror::Error;

/// Error types for treesync operations
#[derive(Debug, Error)]
pub enum SyncError {
    /// Standard IO error (automatically converted via #[from])
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Validation error (logic checks)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Label is unknown to the tracking file, or names the wrong kind of change
    #[error("Invalid label: {label}")]
    InvalidLabel { label: String },

    /// A persisted state file an operation depends on does not exist
    #[error("No {what} found at {}. Run `treesync analyze` first.", path.display())]
    MissingState { what: &'static str, path: PathBuf },

    /// Tracking or decision file could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Permission denied for specific path
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Disk full error
    #[error("Disk full while writing {path}")]
    DiskFull { path: PathBuf },
}

impl SyncError {
    /// Per-item failures that are reported and skipped without stopping a batch
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SyncError::Io(_) | SyncError::PermissionDenied { .. } | SyncError::InvalidLabel { .. }
        )
    }

    /// Check if this error is a validation error
    pub fn is_validation_error(&self) -> bool {
        matches!(self, SyncError::Validation(_) | SyncError::Config(_))
    }

    /// Unknown label passed to review/apply
    pub fn is_invalid_reference(&self) -> bool {
        matches!(self, SyncError::InvalidLabel { .. })
    }

    /// Tracking or decision file absent when an operation needs it
    pub fn is_missing_state(&self) -> bool {
        matches!(self, SyncError::MissingState { .. })
    }

    /// Check if this error is related to permissions
    pub fn is_permission_error(&self) -> bool {
        matches!(self, SyncError::PermissionDenied { .. })
    }

    pub(crate) fn invalid_label(label: &str) -> Self {
        SyncError::InvalidLabel {
            label: label.to_string(),
        }
    }

    /// Map an IO error on `path` to the most specific variant.
    pub(crate) fn from_io(path: &std::path::Path, error: std::io::Error) -> Self {
        use std::io::ErrorKind;

        if matches!(error.kind(), ErrorKind::PermissionDenied) {
            SyncError::PermissionDenied {
                path: path.to_path_buf(),
            }
        } else if matches!(error.kind(), ErrorKind::StorageFull)
            || matches!(error.raw_os_error(), Some(28 | 122))
        {
            SyncError::DiskFull {
                path: path.to_path_buf(),
            }
        } else {
            SyncError::Io(error)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error as IoError, ErrorKind};

    #[test]
    fn test_io_error_automatic_conversion() {
        let io_error = IoError::new(ErrorKind::NotFound, "file not found");
        let sync_error: SyncError = io_error.into();

        assert!(matches!(sync_error, SyncError::Io(_)));
        assert!(sync_error.to_string().contains("IO error"));
    }

    #[test]
    fn test_io_error_from_function() {
        fn returns_io_error() -> Result<(), SyncError> {
            let _file = std::fs::File::open("/nonexistent/path/file.txt")?;
            Ok(())
        }

        let result = returns_io_error();
        assert!(matches!(result.unwrap_err(), SyncError::Io(_)));
    }

    #[test]
    fn test_invalid_label() {
        let error = SyncError::invalid_label("U999");
        assert_eq!(error.to_string(), "Invalid label: U999");
        assert!(error.is_invalid_reference());
        assert!(error.is_recoverable());
        assert!(!error.is_missing_state());
    }

    #[test]
    fn test_missing_state_mentions_analyze() {
        let error = SyncError::MissingState {
            what: "sync data",
            path: PathBuf::from("out/00_REPORTS/sync_tracking.json"),
        };
        let message = error.to_string();
        assert!(message.contains("sync_tracking.json"));
        assert!(message.contains("treesync analyze"));
        assert!(error.is_missing_state());
        assert!(!error.is_recoverable());
    }

    #[test]
    fn test_serialization_error_conversion() {
        fn parse() -> Result<serde_json::Value, SyncError> {
            Ok(serde_json::from_str("{ not json")?)
        }

        let err = parse().unwrap_err();
        assert!(matches!(err, SyncError::Serialization(_)));
    }

    #[test]
    fn test_from_io_maps_permission_denied() {
        let path = PathBuf::from("/protected/file.txt");
        let err = SyncError::from_io(&path, IoError::new(ErrorKind::PermissionDenied, "nope"));
        assert!(err.is_permission_error());
        assert!(err.to_string().contains("/protected/file.txt"));
    }

    #[test]
    fn test_from_io_keeps_other_kinds() {
        let err = SyncError::from_io(
            std::path::Path::new("x"),
            IoError::new(ErrorKind::NotFound, "gone"),
        );
        assert!(matches!(err, SyncError::Io(_)));
    }

    #[test]
    fn test_is_validation_error() {
        assert!(SyncError::Config("error".to_string()).is_validation_error());
        assert!(SyncError::Validation("error".to_string()).is_validation_error());
        assert!(!SyncError::invalid_label("F001").is_validation_error());
    }
}
