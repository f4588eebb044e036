//! Review decision store
//!
//! Every label lives in at most one bucket (`approved`, `rejected` or `partial`).
//! Recording a decision removes the label from all buckets before inserting it, so
//! the store cannot end up with contradictory verdicts for one label.

use crate::state::{load_json, save_json};
use crate::types::SyncError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Hunk tally of a file that was not decided unanimously
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialReview {
    pub file: String,
    pub approved: usize,
    pub rejected: usize,
    pub total: usize,
    pub timestamp: String,
}

impl PartialReview {
    pub fn new(file: impl Into<String>, approved: usize, rejected: usize, total: usize) -> Self {
        Self {
            file: file.into(),
            approved,
            rejected,
            total,
            timestamp: chrono::Local::now().to_rfc3339(),
        }
    }

    /// Hunks neither approved nor rejected
    pub fn skipped(&self) -> usize {
        self.total.saturating_sub(self.approved + self.rejected)
    }
}

/// Verdict for one label
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewDecision {
    Approved(String),
    Rejected(String),
    Partial(PartialReview),
}

/// Bucket sizes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecisionCounts {
    pub approved: usize,
    pub rejected: usize,
    pub partial: usize,
}

/// Contents of `00_REPORTS/review_decisions.json`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionStore {
    #[serde(default)]
    pub approved: BTreeMap<String, String>,
    #[serde(default)]
    pub rejected: BTreeMap<String, String>,
    #[serde(default)]
    pub partial: BTreeMap<String, PartialReview>,
}

impl DecisionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load an existing decision file
    ///
    /// # Errors
    /// `SyncError::MissingState` when no decision file exists
    pub fn load(path: &Path) -> Result<Self, SyncError> {
        load_json(path)?.ok_or_else(|| SyncError::MissingState {
            what: "review decisions",
            path: path.to_path_buf(),
        })
    }

    /// Load the decision file, or start empty when there is none yet
    pub fn load_or_default(path: &Path) -> Result<Self, SyncError> {
        Ok(load_json(path)?.unwrap_or_default())
    }

    /// Write pretty JSON through a temp file
    pub fn save(&self, path: &Path) -> Result<(), SyncError> {
        save_json(path, self)
    }

    /// Record a verdict, replacing whatever the label had before
    pub fn record_decision(&mut self, label: &str, decision: ReviewDecision) {
        self.forget(label);
        match decision {
            ReviewDecision::Approved(path) => {
                self.approved.insert(label.to_string(), path);
            }
            ReviewDecision::Rejected(path) => {
                self.rejected.insert(label.to_string(), path);
            }
            ReviewDecision::Partial(review) => {
                self.partial.insert(label.to_string(), review);
            }
        }
    }

    /// Remove a label from every bucket
    pub fn forget(&mut self, label: &str) {
        self.approved.remove(label);
        self.rejected.remove(label);
        self.partial.remove(label);
    }

    pub fn decision_for(&self, label: &str) -> Option<ReviewDecision> {
        if let Some(path) = self.approved.get(label) {
            return Some(ReviewDecision::Approved(path.clone()));
        }
        if let Some(path) = self.rejected.get(label) {
            return Some(ReviewDecision::Rejected(path.clone()));
        }
        self.partial
            .get(label)
            .map(|review| ReviewDecision::Partial(review.clone()))
    }

    pub fn counts(&self) -> DecisionCounts {
        DecisionCounts {
            approved: self.approved.len(),
            rejected: self.rejected.len(),
            partial: self.partial.len(),
        }
    }

    /// Promote partial entries that are actually unanimous.
    ///
    /// `approved == total` moves the label to `approved`, `rejected == total` to
    /// `rejected` (both only when `total > 0`). Returns the promoted labels; a
    /// second call finds nothing left to promote.
    pub fn reconcile_partials(&mut self) -> Vec<String> {
        let promotions: Vec<(String, ReviewDecision)> = self
            .partial
            .iter()
            .filter(|(_, review)| review.total > 0)
            .filter_map(|(label, review)| {
                if review.approved == review.total {
                    Some((label.clone(), ReviewDecision::Approved(review.file.clone())))
                } else if review.rejected == review.total {
                    Some((label.clone(), ReviewDecision::Rejected(review.file.clone())))
                } else {
                    None
                }
            })
            .collect();

        let mut promoted = Vec::with_capacity(promotions.len());
        for (label, decision) in promotions {
            self.record_decision(&label, decision);
            promoted.push(label);
        }
        promoted
    }
}
