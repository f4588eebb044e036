//! Durable state kept in the reports directory between invocations

pub mod decisions;
pub mod tracking;

pub use decisions::{DecisionCounts, DecisionStore, PartialReview, ReviewDecision};
pub use tracking::TrackingState;

use crate::executor::copy::write_atomic;
use crate::types::SyncError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// Read a JSON file; `Ok(None)` when it does not exist
pub(crate) fn load_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, SyncError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(SyncError::from_io(path, e)),
    };
    Ok(Some(serde_json::from_str(&raw)?))
}

/// Write pretty JSON through a temp file and rename
pub(crate) fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<(), SyncError> {
    let mut json = serde_json::to_string_pretty(value)?;
    json.push('\n');
    write_atomic(path, json.as_bytes())
}
