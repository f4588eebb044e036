//! Review commands: review, quick, approve, reject, fix-decisions
//!
//! Every command loads the decision file, changes it and writes it back before
//! returning, including after the reviewer quits.

use super::{apply, open_analysis};
use crate::config::Config;
use crate::executor::write_atomic;
use crate::labels::preview::{PreviewLayout, UpdateArtifacts};
use crate::labels::LabelKind;
use crate::review::{quick_review, review_label, DecisionSource, FileDecision, ReviewOutcome};
use crate::state::{DecisionStore, ReviewDecision};
use crate::types::SyncError;
use crate::ui::TerminalPrompt;
use console::style;
use std::fs;
use std::path::{Path, PathBuf};

/// Review one update label hunk by hunk
pub fn review(config: &Config, label: &str) -> Result<(), SyncError> {
    let (layout, tracking) = open_analysis(config)?;
    let decisions_file = layout.decisions_file();
    let mut store = DecisionStore::load_or_default(&decisions_file)?;

    if tracking.is_binary(label) {
        println!(
            "{} is binary and has no hunks. Use `treesync approve {}` or `treesync reject {}`.",
            label, label, label
        );
        return Ok(());
    }

    let mut prompt = TerminalPrompt::stdin();
    let outcome = review_label(label, &tracking, &layout, &mut store, &mut prompt)?;
    store.save(&decisions_file)?;

    match outcome {
        ReviewOutcome::Quit => println!("Review of {} stopped; nothing recorded for it.", label),
        ReviewOutcome::Reviewed(review) => println!("{}", describe_decision(label, review.decision)),
    }
    Ok(())
}

pub fn describe_decision(label: &str, decision: FileDecision) -> String {
    match decision {
        FileDecision::Unset => format!("{}: no changes to review", label),
        FileDecision::FullyApproved => format!("{} {}", label, style("approved").green()),
        FileDecision::FullyRejected => format!("{} {}", label, style("rejected").red()),
        FileDecision::Partial {
            approved,
            rejected,
            total,
        } => format!(
            "{} {}: {} approved, {} rejected of {} hunks. The merged preview is in {}.",
            label,
            style("partially approved").yellow(),
            approved,
            rejected,
            total,
            UpdateArtifacts::MERGED
        ),
    }
}

/// Walk every update once and take a whole-file decision
pub fn quick(config: &Config) -> Result<(), SyncError> {
    let (layout, tracking) = open_analysis(config)?;
    let decisions_file = layout.decisions_file();
    let mut store = DecisionStore::load_or_default(&decisions_file)?;

    let mut prompt = TerminalPrompt::stdin();
    let result = quick_review(&tracking, &layout, &mut store, &mut prompt);
    store.save(&decisions_file)?;
    let summary = result?;

    println!(
        "Quick review {}: {} approved, {} rejected, {} reviewed in detail, {} skipped",
        if summary.quit { "stopped" } else { "complete" },
        summary.approved,
        summary.rejected,
        summary.detailed,
        summary.skipped
    );
    println!("Decisions saved to {}", decisions_file.display());

    let apply_now = finish_review(config, &layout, &store, &mut prompt)?;
    // The apply step takes its own stdin lock for overwrite prompts
    drop(prompt);
    if apply_now {
        apply::apply_reviewed(config)?;
    }
    Ok(())
}

/// Print the final tally and write the apply script; `true` when the reviewer wants the
/// approved labels applied right away
fn finish_review(
    config: &Config,
    layout: &PreviewLayout,
    store: &DecisionStore,
    source: &mut dyn DecisionSource,
) -> Result<bool, SyncError> {
    println!();
    println!("{}", format_final_summary(store));

    if store.approved.is_empty() {
        println!("No approved changes to apply.");
        return Ok(false);
    }

    let script = write_apply_script(layout, store, &config.output_dir)?;
    println!("Apply script written to {}", script.display());

    if source.confirm_apply(store.approved.len())? {
        return Ok(true);
    }
    println!(
        "Changes saved but not applied. Run `treesync apply` or {} later.",
        script.display()
    );
    Ok(false)
}

pub fn format_final_summary(store: &DecisionStore) -> String {
    let counts = store.counts();
    [
        style("Final review summary").bold().to_string(),
        "=".repeat(40),
        format!("{}: {} file(s)", style("Approved").green(), counts.approved),
        format!("{}: {} file(s)", style("Rejected").red(), counts.rejected),
        format!("{}: {} file(s)", style("Partial").yellow(), counts.partial),
    ]
    .join("\n")
}

/// Write `apply_approved.sh`: one apply command per approved label, in label order.
///
/// The script passes `--output` explicitly so it can be run from any directory.
pub fn write_apply_script(
    layout: &PreviewLayout,
    store: &DecisionStore,
    output_dir: &Path,
) -> Result<PathBuf, SyncError> {
    let output = fs::canonicalize(output_dir).unwrap_or_else(|_| output_dir.to_path_buf());
    let output = shell_quote(&output.display().to_string());

    let mut labels: Vec<&String> = store.approved.keys().collect();
    labels.sort_by(|a, b| (a.len(), a).cmp(&(b.len(), b)));

    let mut script = format!(
        "#!/bin/sh\n# Applies the labels approved on {}\nset -e\n\n",
        chrono::Local::now().to_rfc3339()
    );
    for label in labels {
        let Some(kind) = LabelKind::of_label(label) else {
            log::warn!("{}: not a label, left out of the apply script", label);
            continue;
        };
        script.push_str(&format!("echo 'Applying {}'\n", label));
        script.push_str(&format!(
            "treesync --output {} {} {}\n",
            output,
            kind.apply_command(),
            label
        ));
    }

    let path = layout.apply_script();
    write_atomic(&path, script.as_bytes())?;
    make_executable(&path)?;
    Ok(path)
}

fn shell_quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', r"'\''"))
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<(), SyncError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).map_err(|e| SyncError::from_io(path, e))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<(), SyncError> {
    Ok(())
}

/// Mark a label approved without hunk review
pub fn approve(config: &Config, label: &str) -> Result<(), SyncError> {
    record(config, label, true)
}

/// Mark a label rejected
pub fn reject(config: &Config, label: &str) -> Result<(), SyncError> {
    record(config, label, false)
}

fn record(config: &Config, label: &str, approve: bool) -> Result<(), SyncError> {
    let (layout, tracking) = open_analysis(config)?;
    let target = tracking.labels.lookup(label)?;

    let decisions_file = layout.decisions_file();
    let mut store = DecisionStore::load_or_default(&decisions_file)?;
    let decision = if approve {
        ReviewDecision::Approved(target.path.clone())
    } else {
        ReviewDecision::Rejected(target.path.clone())
    };
    store.record_decision(label, decision);
    store.save(&decisions_file)?;

    let verdict = if approve {
        style("approved").green()
    } else {
        style("rejected").red()
    };
    println!("{} ({}) {}", label, target.path, verdict);
    Ok(())
}

/// Promote unanimous partial reviews
pub fn fix_decisions(config: &Config) -> Result<(), SyncError> {
    let layout = PreviewLayout::new(&config.output_dir);
    let decisions_file = layout.decisions_file();
    let mut store = DecisionStore::load(&decisions_file)?;

    let promoted = store.reconcile_partials();
    store.save(&decisions_file)?;

    if promoted.is_empty() {
        println!("No partial decisions needed fixing.");
    } else {
        for label in &promoted {
            println!("  fixed {}", label);
        }
        println!("Fixed {} decision(s).", promoted.len());
    }
    let counts = store.counts();
    println!(
        "Approved: {}  Rejected: {}  Partial: {}",
        counts.approved, counts.rejected, counts.partial
    );
    Ok(())
}
