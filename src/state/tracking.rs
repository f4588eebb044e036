//! Tracking file: the durable result of one analysis run

use crate::labels::LabelRegistry;
use crate::state::{load_json, save_json};
use crate::types::{Statistics, SyncError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Contents of `00_REPORTS/sync_tracking.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingState {
    /// RFC 3339 time of the analysis
    pub timestamp: String,
    pub old_project: PathBuf,
    #[serde(rename = "new_figma")]
    pub new_project: PathBuf,
    pub statistics: Statistics,
    pub labels: LabelRegistry,
    /// Update labels whose files are not text; they are replaced wholesale
    #[serde(default)]
    pub binary_updates: Vec<String>,
}

impl TrackingState {
    pub fn new(
        old_project: PathBuf,
        new_project: PathBuf,
        statistics: Statistics,
        labels: LabelRegistry,
    ) -> Self {
        Self {
            timestamp: chrono::Local::now().to_rfc3339(),
            old_project,
            new_project,
            statistics,
            labels,
            binary_updates: Vec::new(),
        }
    }

    /// Load the tracking file
    ///
    /// # Errors
    /// `SyncError::MissingState` when the file does not exist
    pub fn load(path: &Path) -> Result<Self, SyncError> {
        load_json(path)?.ok_or_else(|| SyncError::MissingState {
            what: "sync data",
            path: path.to_path_buf(),
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), SyncError> {
        save_json(path, self)
    }

    pub fn is_binary(&self, label: &str) -> bool {
        self.binary_updates.iter().any(|l| l == label)
    }
}
