//! Hunk-level review
//!
//! A file is reviewed one hunk at a time. Each hunk goes from `Pending` to
//! `Approved`, `Rejected` or `Skipped`; once every hunk has been visited the file gets
//! a [`FileDecision`]. Choices come from a [`DecisionSource`], which is the terminal
//! prompt in the binary and a scripted source in tests.

use crate::diff::{apply_hunks, parse_hunks, Hunk};
use crate::executor::copy::write_atomic;
use crate::labels::preview::PreviewLayout;
use crate::labels::{LabelKind, LabelTarget};
use crate::state::{DecisionStore, PartialReview, ReviewDecision, TrackingState};
use crate::types::SyncError;
use std::collections::VecDeque;
use std::fs;

/// Verdict for one hunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HunkState {
    Pending,
    Approved,
    Rejected,
    Skipped,
}

/// Verdict for a whole file, derived from its hunk states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileDecision {
    /// No hunks to review
    Unset,
    FullyApproved,
    FullyRejected,
    Partial {
        approved: usize,
        rejected: usize,
        total: usize,
    },
}

/// A reviewer's answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewChoice {
    Approve,
    Reject,
    Skip,
    /// Show more context, then ask again
    ViewContext,
    Quit,
}

/// Question asked for one hunk
#[derive(Debug)]
pub struct HunkRequest<'a> {
    pub label: &'a str,
    pub path: &'a str,
    /// Zero-based position of the hunk
    pub index: usize,
    pub total: usize,
    pub hunk: &'a Hunk,
    /// Full unified diff of the file, for context display
    pub diff_text: &'a str,
}

/// Question asked for one file during quick review
#[derive(Debug)]
pub struct FileRequest<'a> {
    pub label: &'a str,
    pub path: &'a str,
    pub added: usize,
    pub removed: usize,
    pub binary: bool,
    pub position: usize,
    pub total: usize,
}

/// Where review choices come from
pub trait DecisionSource {
    fn choose_hunk(&mut self, request: &HunkRequest<'_>) -> Result<ReviewChoice, SyncError>;

    /// Display the full context of a hunk after `ViewContext`
    fn show_context(&mut self, _request: &HunkRequest<'_>) -> Result<(), SyncError> {
        Ok(())
    }

    fn choose_file(&mut self, request: &FileRequest<'_>) -> Result<ReviewChoice, SyncError>;

    /// Asked once a review pass ends with approved labels; `true` applies them now
    fn confirm_apply(&mut self, _approved: usize) -> Result<bool, SyncError> {
        Ok(false)
    }
}

/// Replays a fixed list of choices. An exhausted script answers `Quit`.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    choices: VecDeque<ReviewChoice>,
}

impl ScriptedSource {
    pub fn new(choices: impl IntoIterator<Item = ReviewChoice>) -> Self {
        Self {
            choices: choices.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.choices.len()
    }

    fn next(&mut self) -> ReviewChoice {
        self.choices.pop_front().unwrap_or(ReviewChoice::Quit)
    }
}

impl DecisionSource for ScriptedSource {
    fn choose_hunk(&mut self, _request: &HunkRequest<'_>) -> Result<ReviewChoice, SyncError> {
        Ok(self.next())
    }

    fn choose_file(&mut self, _request: &FileRequest<'_>) -> Result<ReviewChoice, SyncError> {
        Ok(self.next())
    }

    /// `Approve` means yes
    fn confirm_apply(&mut self, _approved: usize) -> Result<bool, SyncError> {
        Ok(self.next() == ReviewChoice::Approve)
    }
}

/// Hunk states and the resulting decision of a completed review
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HunkReview {
    pub states: Vec<HunkState>,
    pub decision: FileDecision,
}

/// Result of reviewing one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewOutcome {
    Reviewed(HunkReview),
    /// Reviewer quit part way; nothing is recorded for this file
    Quit,
}

/// Derive the file decision from fully visited hunk states
pub fn evaluate(states: &[HunkState]) -> FileDecision {
    let total = states.len();
    if total == 0 {
        return FileDecision::Unset;
    }

    let approved = states.iter().filter(|s| **s == HunkState::Approved).count();
    let rejected = states.iter().filter(|s| **s == HunkState::Rejected).count();

    if approved == total {
        FileDecision::FullyApproved
    } else if rejected == total {
        FileDecision::FullyRejected
    } else {
        FileDecision::Partial {
            approved,
            rejected,
            total,
        }
    }
}

/// Ask `source` about every hunk in order
pub fn review_hunks(
    label: &str,
    path: &str,
    diff_text: &str,
    hunks: &[Hunk],
    source: &mut dyn DecisionSource,
) -> Result<ReviewOutcome, SyncError> {
    let mut states = vec![HunkState::Pending; hunks.len()];

    for (index, hunk) in hunks.iter().enumerate() {
        let request = HunkRequest {
            label,
            path,
            index,
            total: hunks.len(),
            hunk,
            diff_text,
        };

        while states[index] == HunkState::Pending {
            match source.choose_hunk(&request)? {
                ReviewChoice::Approve => states[index] = HunkState::Approved,
                ReviewChoice::Reject => states[index] = HunkState::Rejected,
                ReviewChoice::Skip => states[index] = HunkState::Skipped,
                ReviewChoice::ViewContext => source.show_context(&request)?,
                ReviewChoice::Quit => {
                    log::info!("Review of {} stopped at hunk {}", label, index + 1);
                    return Ok(ReviewOutcome::Quit);
                }
            }
        }
    }

    let decision = evaluate(&states);
    Ok(ReviewOutcome::Reviewed(HunkReview { states, decision }))
}

/// Resolve an update label for review
pub fn update_target(tracking: &TrackingState, label: &str) -> Result<LabelTarget, SyncError> {
    let target = tracking.labels.lookup(label)?;
    if target.kind != LabelKind::Update {
        return Err(SyncError::invalid_label(label));
    }
    Ok(target)
}

/// Review one update label hunk by hunk and record the result in `store`.
///
/// The diff comes from the label's `changes.diff` in the preview area. A partial
/// outcome also writes `partial.merged`: the old file with only the approved hunks
/// applied. The caller saves the store.
pub fn review_label(
    label: &str,
    tracking: &TrackingState,
    layout: &PreviewLayout,
    store: &mut DecisionStore,
    source: &mut dyn DecisionSource,
) -> Result<ReviewOutcome, SyncError> {
    let target = update_target(tracking, label)?;
    let artifacts = layout.update_artifacts(label);

    let diff_path = artifacts.diff();
    let diff_text = fs::read_to_string(&diff_path).map_err(|e| SyncError::from_io(&diff_path, e))?;
    let hunks = parse_hunks(&diff_text);

    let outcome = review_hunks(label, &target.path, &diff_text, &hunks, source)?;
    let review = match outcome {
        ReviewOutcome::Reviewed(review) => review,
        ReviewOutcome::Quit => return Ok(ReviewOutcome::Quit),
    };

    match review.decision {
        FileDecision::Unset => {
            log::info!("{}: no reviewable changes", label);
        }
        FileDecision::FullyApproved => {
            store.record_decision(label, ReviewDecision::Approved(target.path.clone()));
            discard_merged_preview(layout, label);
        }
        FileDecision::FullyRejected => {
            store.record_decision(label, ReviewDecision::Rejected(target.path.clone()));
            discard_merged_preview(layout, label);
        }
        FileDecision::Partial {
            approved,
            rejected,
            total,
        } => {
            store.record_decision(
                label,
                ReviewDecision::Partial(PartialReview::new(&target.path, approved, rejected, total)),
            );
            if let Err(e) = write_merged_preview(layout, label, &hunks, &review.states) {
                log::warn!("{}: could not write merged preview: {}", label, e);
            }
        }
    }

    Ok(ReviewOutcome::Reviewed(review))
}

fn write_merged_preview(
    layout: &PreviewLayout,
    label: &str,
    hunks: &[Hunk],
    states: &[HunkState],
) -> Result<(), SyncError> {
    let artifacts = layout.update_artifacts(label);
    let old_path = artifacts.old();
    let old = fs::read_to_string(&old_path).map_err(|e| SyncError::from_io(&old_path, e))?;

    let merged = apply_hunks(&old, hunks, |index, _| states[index] == HunkState::Approved)?;
    write_atomic(&artifacts.merged(), merged.as_bytes())
}

/// A whole-file decision makes an earlier `partial.merged` stale
fn discard_merged_preview(layout: &PreviewLayout, label: &str) {
    let merged = layout.update_artifacts(label).merged();
    match fs::remove_file(&merged) {
        Ok(()) => log::debug!("{}: removed stale {}", label, merged.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => log::warn!("{}: could not remove {}: {}", label, merged.display(), e),
    }
}

/// Tally of a quick review pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuickSummary {
    pub approved: usize,
    pub rejected: usize,
    pub detailed: usize,
    pub skipped: usize,
    pub quit: bool,
}

/// Walk every update label once and take a whole-file decision.
///
/// `ViewContext` drops into the detailed hunk review for that label. `Quit` stops the
/// pass; decisions recorded so far stay in `store`.
pub fn quick_review(
    tracking: &TrackingState,
    layout: &PreviewLayout,
    store: &mut DecisionStore,
    source: &mut dyn DecisionSource,
) -> Result<QuickSummary, SyncError> {
    let updates = tracking.labels.labels_of(LabelKind::Update);
    let mut summary = QuickSummary::default();

    for (position, target) in updates.iter().enumerate() {
        let diff_path = layout.update_artifacts(&target.label).diff();
        let (added, removed) = match fs::read_to_string(&diff_path) {
            Ok(text) => parse_hunks(&text)
                .iter()
                .fold((0, 0), |(a, r), h| (a + h.added(), r + h.removed())),
            Err(e) => {
                log::warn!("Cannot read {}: {}", diff_path.display(), e);
                (0, 0)
            }
        };

        let request = FileRequest {
            label: &target.label,
            path: &target.path,
            added,
            removed,
            binary: tracking.is_binary(&target.label),
            position,
            total: updates.len(),
        };

        match source.choose_file(&request)? {
            ReviewChoice::Approve => {
                store.record_decision(&target.label, ReviewDecision::Approved(target.path.clone()));
                discard_merged_preview(layout, &target.label);
                summary.approved += 1;
            }
            ReviewChoice::Reject => {
                store.record_decision(&target.label, ReviewDecision::Rejected(target.path.clone()));
                discard_merged_preview(layout, &target.label);
                summary.rejected += 1;
            }
            ReviewChoice::Skip => summary.skipped += 1,
            ReviewChoice::ViewContext => {
                summary.detailed += 1;
                if review_label(&target.label, tracking, layout, store, source)? == ReviewOutcome::Quit {
                    summary.quit = true;
                    break;
                }
            }
            ReviewChoice::Quit => {
                summary.quit = true;
                break;
            }
        }
    }

    Ok(summary)
}
