//! Read-only commands: list, view-diff, side-by-side, smart-diff, show-decisions

use super::open_analysis;
use crate::config::Config;
use crate::diff::{parse_hunks, side_by_side as diff_rows, ChangeHints, Hunk, Row};
use crate::labels::preview::PreviewLayout;
use crate::labels::{LabelKind, LabelTarget};
use crate::review::update_target;
use crate::state::{DecisionStore, ReviewDecision, TrackingState};
use crate::types::SyncError;
use crate::ui::style_diff_line;
use console::style;
use std::fs;

/// Print every label grouped by kind, with its review status
pub fn list(config: &Config) -> Result<(), SyncError> {
    let (layout, tracking) = open_analysis(config)?;
    let store = DecisionStore::load_or_default(&layout.decisions_file())?;
    println!("{}", format_listing(&tracking, &store));
    Ok(())
}

pub fn format_listing(tracking: &TrackingState, store: &DecisionStore) -> String {
    let mut lines = vec![format!(
        "Analysis from {}\n  old: {}\n  new: {}",
        tracking.timestamp,
        tracking.old_project.display(),
        tracking.new_project.display()
    )];

    for (kind, title) in [
        (LabelKind::Folder, "New folders"),
        (LabelKind::NewFile, "New files"),
        (LabelKind::Update, "Updated files"),
    ] {
        let targets = tracking.labels.labels_of(kind);
        lines.push(String::new());
        lines.push(format!("{} ({})", style(title).bold(), targets.len()));
        if targets.is_empty() {
            lines.push("  (none)".to_string());
        }
        for target in targets {
            lines.push(format_target(&target, tracking, store));
        }
    }

    let stats = &tracking.statistics;
    if stats.deleted_files + stats.deleted_folders > 0 {
        lines.push(String::new());
        lines.push(format!(
            "{} deleted folder(s) and {} deleted file(s) are listed in the preview, not applied.",
            stats.deleted_folders, stats.deleted_files
        ));
    }
    lines.join("\n")
}

fn format_target(target: &LabelTarget, tracking: &TrackingState, store: &DecisionStore) -> String {
    let mut line = format!("  {}  {}", style(&target.label).cyan(), target.path);
    if target.kind == LabelKind::Folder {
        line.push('/');
    }
    if tracking.is_binary(&target.label) {
        line.push_str(" (binary)");
    }
    match store.decision_for(&target.label) {
        Some(ReviewDecision::Approved(_)) => {
            line.push_str(&format!("  {}", style("approved").green()))
        }
        Some(ReviewDecision::Rejected(_)) => {
            line.push_str(&format!("  {}", style("rejected").red()))
        }
        Some(ReviewDecision::Partial(review)) => line.push_str(&format!(
            "  {}",
            style(format!("partial {}/{}", review.approved, review.total)).yellow()
        )),
        None => {}
    }
    line
}

/// Print the stored unified diff of an update label
pub fn view_diff(config: &Config, label: &str) -> Result<(), SyncError> {
    let (layout, tracking) = open_analysis(config)?;
    println!("{}", render_diff(&layout, &tracking, label)?);
    Ok(())
}

pub fn render_diff(
    layout: &PreviewLayout,
    tracking: &TrackingState,
    label: &str,
) -> Result<String, SyncError> {
    match stored_diff(layout, tracking, label)?.1 {
        StoredDiff::Notice(message) => Ok(message),
        StoredDiff::Text(text) => Ok(style_lines(&text)),
    }
}

/// Diff text of an update label, or what to print when there is none
enum StoredDiff {
    Text(String),
    Notice(String),
}

fn stored_diff(
    layout: &PreviewLayout,
    tracking: &TrackingState,
    label: &str,
) -> Result<(LabelTarget, StoredDiff), SyncError> {
    let target = update_target(tracking, label)?;
    if tracking.is_binary(label) {
        let notice = format!(
            "{} is a binary file; no line diff. Use `treesync apply-update {}` to replace it.",
            target.path, label
        );
        return Ok((target, StoredDiff::Notice(notice)));
    }

    let diff_path = layout.update_artifacts(label).diff();
    let text = fs::read_to_string(&diff_path).map_err(|e| SyncError::from_io(&diff_path, e))?;
    if text.is_empty() {
        let notice = format!("No line changes recorded for {}", target.path);
        return Ok((target, StoredDiff::Notice(notice)));
    }
    Ok((target, StoredDiff::Text(text)))
}

fn style_lines(diff_text: &str) -> String {
    diff_text
        .lines()
        .map(style_diff_line)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Width of each column in the side-by-side view
const COLUMN_WIDTH: usize = 40;

/// Print an update label as OLD | NEW columns
pub fn side_by_side(config: &Config, label: &str) -> Result<(), SyncError> {
    let (layout, tracking) = open_analysis(config)?;
    println!("{}", render_side_by_side(&layout, &tracking, label, COLUMN_WIDTH)?);
    Ok(())
}

pub fn render_side_by_side(
    layout: &PreviewLayout,
    tracking: &TrackingState,
    label: &str,
    width: usize,
) -> Result<String, SyncError> {
    let text = match stored_diff(layout, tracking, label)?.1 {
        StoredDiff::Notice(message) => return Ok(message),
        StoredDiff::Text(text) => text,
    };
    let hunks = parse_hunks(&text);

    let blank = " ".repeat(width);
    let mut lines = vec![
        style(format!("{} | NEW", cell("OLD", width))).bold().to_string(),
        "=".repeat(width * 2 + 3),
    ];
    for row in diff_rows(&hunks) {
        let line = match row {
            Row::Hunk(header) => style(header).cyan().to_string(),
            Row::Same(text) => format!("{} | {}", cell(text, width), cell(text, width)),
            Row::Changed { old, new } => format!(
                "{} | {}",
                old.map(|t| style(cell(t, width)).red().to_string())
                    .unwrap_or_else(|| blank.clone()),
                new.map(|t| style(cell(t, width)).green().to_string())
                    .unwrap_or_default()
            ),
        };
        lines.push(line);
    }
    Ok(lines.join("\n"))
}

/// Fit one line into a column: tabs expanded, clipped, padded
fn cell(text: &str, width: usize) -> String {
    let text = text.trim_end().replace('\t', "    ");
    let clipped: String = text.chars().take(width).collect();
    format!("{:<width$}", clipped, width = width)
}

/// Print an update label's diff headed by what kind of code it touches
pub fn smart_diff(config: &Config, label: &str) -> Result<(), SyncError> {
    let (layout, tracking) = open_analysis(config)?;
    println!("{}", render_smart_diff(&layout, &tracking, label)?);
    Ok(())
}

pub fn render_smart_diff(
    layout: &PreviewLayout,
    tracking: &TrackingState,
    label: &str,
) -> Result<String, SyncError> {
    let (target, text) = match stored_diff(layout, tracking, label)? {
        (_, StoredDiff::Notice(message)) => return Ok(message),
        (target, StoredDiff::Text(text)) => (target, text),
    };
    let hunks = parse_hunks(&text);
    let hints = ChangeHints::from_hunks(&hunks);

    let mut lines = vec![
        style(format!("Smart diff for {} ({})", label, target.path))
            .cyan()
            .bold()
            .to_string(),
        "=".repeat(50),
        format!(
            "{} change block(s)  {} / {}",
            hunks.len(),
            style(format!("+{}", hunks.iter().map(Hunk::added).sum::<usize>())).green(),
            style(format!("-{}", hunks.iter().map(Hunk::removed).sum::<usize>())).red()
        ),
    ];
    if hints.is_empty() {
        lines.push("No import or code structure changes spotted".to_string());
    }
    for hint in hints.descriptions() {
        lines.push(format!("  {} {}", style("*").yellow(), hint));
    }
    lines.push(String::new());
    lines.push(style_lines(&text));
    Ok(lines.join("\n"))
}

/// Print the decision buckets
pub fn show_decisions(config: &Config) -> Result<(), SyncError> {
    let layout = PreviewLayout::new(&config.output_dir);
    let store = DecisionStore::load(&layout.decisions_file())?;
    println!("{}", format_decisions(&store));
    Ok(())
}

pub fn format_decisions(store: &DecisionStore) -> String {
    let counts = store.counts();
    let mut lines = Vec::new();

    lines.push(format!("{} ({})", style("Approved").green().bold(), counts.approved));
    for (label, path) in &store.approved {
        lines.push(format!("  {}  {}", label, path));
    }

    lines.push(format!("{} ({})", style("Rejected").red().bold(), counts.rejected));
    for (label, path) in &store.rejected {
        lines.push(format!("  {}  {}", label, path));
    }

    lines.push(format!("{} ({})", style("Partial").yellow().bold(), counts.partial));
    for (label, review) in &store.partial {
        lines.push(format!(
            "  {}  {}  {} approved, {} rejected, {} skipped of {}",
            label,
            review.file,
            review.approved,
            review.rejected,
            review.skipped(),
            review.total
        ));
    }

    if counts.partial > 0 {
        lines.push("Partial labels are not applied. Run `treesync fix-decisions` to promote unanimous ones.".to_string());
    }
    lines.join("\n")
}
