//! Apply commands: apply, add-folder/add-file/apply-update and their batch forms

use super::open_analysis;
use crate::config::Config;
use crate::executor::{
    apply_all_of_kind, apply_approved, apply_label, ApplyCallback, ApplyContext, ApplyEvent,
    ApplyStats, BackupOutcome, LabelApplied, OverwritePolicy,
};
use crate::labels::{LabelKind, LabelTarget};
use crate::state::DecisionStore;
use crate::types::SyncError;
use crate::ui::{ProgressReporter, TerminalPrompt};
use console::style;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::Path;

/// Apply every approved label
pub fn apply_reviewed(config: &Config) -> Result<(), SyncError> {
    let (layout, tracking) = open_analysis(config)?;
    let store = DecisionStore::load(&layout.decisions_file())?;

    let counts = store.counts();
    if counts.partial > 0 {
        println!(
            "{} {} partially reviewed label(s) will not be applied.",
            style("note:").yellow(),
            counts.partial
        );
    }
    if counts.approved == 0 {
        println!("No approved labels to apply.");
        return Ok(());
    }

    let ctx = ApplyContext {
        tracking: &tracking,
        layout: &layout,
        config,
    };
    run_batch(|policy, on_event| apply_approved(&store, ctx, policy, on_event))
}

/// Apply every label of one kind
pub fn apply_all(config: &Config, kind: LabelKind) -> Result<(), SyncError> {
    let (layout, tracking) = open_analysis(config)?;
    if tracking.labels.labels_of(kind).is_empty() {
        println!("No {} labels to apply.", kind);
        return Ok(());
    }

    let ctx = ApplyContext {
        tracking: &tracking,
        layout: &layout,
        config,
    };
    run_batch(|policy, on_event| apply_all_of_kind(kind, ctx, policy, on_event))
}

/// Apply a single label of the expected kind
pub fn apply_one(config: &Config, label: &str, kind: LabelKind) -> Result<(), SyncError> {
    let (layout, tracking) = open_analysis(config)?;
    let ctx = ApplyContext {
        tracking: &tracking,
        layout: &layout,
        config,
    };

    let mut prompt = TerminalPrompt::stdin();
    match apply_label(label, Some(kind), ctx, &mut prompt)? {
        LabelApplied::Applied {
            target,
            files_copied,
            backup,
        } => println!("{}", format_applied(&target, files_copied, &backup)),
        LabelApplied::Skipped { target } => {
            println!("{} {} kept unchanged", style("skip").yellow(), target.path)
        }
    }
    Ok(())
}

/// Drive one batch with the progress bar and a terminal overwrite prompt, then print
/// an error summary for the labels that failed.
fn run_batch<F>(apply: F) -> Result<(), SyncError>
where
    F: FnOnce(&mut dyn OverwritePolicy, Option<&ApplyCallback<'_>>) -> Result<ApplyStats, SyncError>,
{
    let reporter = ProgressReporter::new();
    let error_records: RefCell<Vec<ErrorRecord>> = RefCell::new(Vec::new());

    let progress_cb = |event: &ApplyEvent| match event {
        ApplyEvent::Start { index, total, label } => {
            if *index == 1 {
                reporter.start_apply(*total as u64);
            }
            reporter.set_current_label(label);
        }
        ApplyEvent::Success {
            target,
            files_copied,
            backup,
            ..
        } => reporter.complete_label(format_applied(target, *files_copied, backup)),
        ApplyEvent::Skipped { target, .. } => {
            reporter.complete_label(format!("{} {} kept unchanged", style("skip").yellow(), target.path))
        }
        ApplyEvent::Covered { target, folder, .. } => reporter.complete_label(format!(
            "{} {} (copied with {})",
            style("done").dim(),
            target.path,
            folder
        )),
        ApplyEvent::Error { label, error, .. } => {
            reporter.apply_error(label, &error.to_string());
            error_records.borrow_mut().push(ErrorRecord::new(label, error));
        }
        ApplyEvent::Complete { stats } => reporter.finish_apply(stats),
    };

    let mut policy = SuspendingPrompt {
        reporter: &reporter,
        prompt: TerminalPrompt::stdin(),
    };
    let result = apply(&mut policy, Some(&progress_cb));

    let records = error_records.borrow();
    if !records.is_empty() {
        println!("{}", format_error_summary(&records));
    }

    result.map(|_| ())
}

/// Terminal prompt that hides the progress bar while asking
struct SuspendingPrompt<'a, R> {
    reporter: &'a ProgressReporter,
    prompt: TerminalPrompt<R>,
}

impl<R: std::io::BufRead> OverwritePolicy for SuspendingPrompt<'_, R> {
    fn confirm_overwrite(&mut self, target: &LabelTarget, dest: &Path) -> Result<bool, SyncError> {
        let prompt = &mut self.prompt;
        self.reporter
            .suspend(|| prompt.confirm_overwrite(target, dest))
    }
}

fn format_applied(target: &LabelTarget, files_copied: u64, backup: &BackupOutcome) -> String {
    let mut line = format!(
        "{} [{}] {}",
        style("✓").green(),
        target.label,
        target.path
    );
    if target.kind == LabelKind::Folder {
        line.push_str(&format!("/ ({} files)", files_copied));
    }
    match backup {
        BackupOutcome::Created(path) => {
            line.push_str(&format!("  backup: {}", path.display()));
        }
        BackupOutcome::Kept(path) => {
            line.push_str(&format!("  existing backup kept: {}", path.display()));
        }
        BackupOutcome::NotNeeded => {}
    }
    line
}

#[derive(Debug)]
struct ErrorRecord {
    kind: &'static str,
    label: String,
    message: String,
    suggestion: Option<String>,
}

impl ErrorRecord {
    fn new(label: &str, error: &SyncError) -> Self {
        let (message, suggestion) = humanize_error(error);
        Self {
            kind: error_kind_label(error),
            label: label.to_string(),
            message,
            suggestion,
        }
    }
}

fn humanize_error(error: &SyncError) -> (String, Option<String>) {
    match error {
        SyncError::Io(io) => match io.kind() {
            ErrorKind::NotFound => (
                "File or directory was not found".to_string(),
                Some("The projects changed since the analysis. Re-run `treesync analyze`.".to_string()),
            ),
            ErrorKind::PermissionDenied => (
                "Permission denied while accessing file".to_string(),
                Some("Check file permissions or run with a user that has access.".to_string()),
            ),
            ErrorKind::AlreadyExists => (
                "The destination path already exists as a file or directory".to_string(),
                Some("Remove or rename the conflicting path, then retry.".to_string()),
            ),
            _ => (
                format!("I/O operation failed: {}", io),
                Some("Retry. If this keeps happening, check disk health and permissions.".to_string()),
            ),
        },
        SyncError::PermissionDenied { path } => (
            format!("Permission denied: {}", path.display()),
            Some("Check file permissions or run with a user that has access.".to_string()),
        ),
        SyncError::DiskFull { path } => (
            format!("Not enough disk space to write {}", path.display()),
            Some("Free disk space in the project and retry.".to_string()),
        ),
        SyncError::InvalidLabel { label } => (
            format!("Label {} is not part of the last analysis", label),
            Some("Run `treesync list` to see the current labels.".to_string()),
        ),
        SyncError::MissingState { .. } => (
            error.to_string(),
            Some("Run `treesync analyze` first.".to_string()),
        ),
        SyncError::Serialization(err) => (
            format!("State file is corrupt: {}", err),
            Some("Re-run `treesync analyze` to rebuild it.".to_string()),
        ),
        SyncError::Config(msg) | SyncError::Validation(msg) => (msg.clone(), None),
    }
}

fn error_kind_label(error: &SyncError) -> &'static str {
    match error {
        SyncError::Io(_) => "I/O error",
        SyncError::Config(_) => "Configuration error",
        SyncError::Validation(_) => "Validation error",
        SyncError::InvalidLabel { .. } => "Invalid label",
        SyncError::MissingState { .. } => "Missing state",
        SyncError::Serialization(_) => "Serialization error",
        SyncError::PermissionDenied { .. } => "Permission denied",
        SyncError::DiskFull { .. } => "Disk full",
    }
}

fn format_error_summary(records: &[ErrorRecord]) -> String {
    let mut groups: BTreeMap<&'static str, Vec<&ErrorRecord>> = BTreeMap::new();
    for record in records {
        groups.entry(record.kind).or_default().push(record);
    }

    let mut lines = Vec::new();
    lines.push("Error summary:".to_string());
    for (kind, items) in groups {
        lines.push(format!("  {} ({}):", kind, items.len()));
        for record in items.iter().take(3) {
            lines.push(format!("    - [{}] {}", record.label, record.message));
            if let Some(suggestion) = &record.suggestion {
                lines.push(format!("      Try: {}", suggestion));
            }
        }
        if items.len() > 3 {
            lines.push(format!("    - ... {} more", items.len() - 3));
        }
    }
    lines.join("\n")
}
