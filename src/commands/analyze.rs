//! Analyze command: scan, classify, label and build the preview area

use crate::classify::classify;
use crate::config::Config;
use crate::labels::preview::{
    update_detail, write_category_index, write_deleted_items, write_file_preview,
    write_folder_preview, write_summary_report, write_update_preview, IndexRow, PreviewLayout,
};
use crate::labels::{assign_labels, LabelKind, LabelRegistry};
use crate::scanner::{scan_tree, ProgressCallback};
use crate::state::TrackingState;
use crate::types::{ChangeSet, ScanTree, Statistics, SyncError};
use crate::ui::ProgressReporter;
use console::style;
use indicatif::HumanBytes;
use std::path::Path;
use std::sync::Arc;

/// Run a full analysis and persist the tracking file.
///
/// Preview failures for single labels are logged and listed in the category index;
/// they never abort the run.
pub fn run(config: &Config) -> Result<TrackingState, SyncError> {
    config.validate()?;

    let reporter = Arc::new(ProgressReporter::new());
    let old_tree = scan_side(&config.old_project, "old project", config, &reporter)?;
    let new_tree = scan_side(&config.new_project, "new project", config, &reporter)?;
    reporter.end_scanning();

    let changes = classify(&old_tree, &new_tree);
    let statistics = changes.statistics();
    log::info!(
        "Classified {} actionable changes ({} unchanged files)",
        statistics.actionable(),
        statistics.identical_files
    );

    let layout = PreviewLayout::new(&config.output_dir);
    layout.prepare()?;

    let labels = assign_labels(&changes);
    let binary_updates = build_previews(&layout, &labels, config)?;
    write_deleted_items(&layout, &changes)?;

    let mut tracking = TrackingState::new(
        config.old_project.clone(),
        config.new_project.clone(),
        statistics,
        labels,
    );
    tracking.binary_updates = binary_updates;
    write_summary_report(&layout, &statistics, &tracking.timestamp)?;
    tracking.save(&layout.tracking_file())?;

    println!("{}", format_statistics(&statistics, &changes));
    println!(
        "Preview written to {}",
        style(layout.root().display()).cyan()
    );
    if !changes.is_unchanged() {
        println!("Next: {} or {}", style("treesync list").bold(), style("treesync quick").bold());
    }

    Ok(tracking)
}

fn scan_side(
    root: &Path,
    side: &'static str,
    config: &Config,
    reporter: &Arc<ProgressReporter>,
) -> Result<ScanTree, SyncError> {
    reporter.start_scan(side);
    let on_progress: ProgressCallback = {
        let reporter = Arc::clone(reporter);
        Box::new(move |files: u64, dirs: u64| reporter.update_scan(side, files, dirs))
    };

    let tree = scan_tree(root, config, Some(&on_progress))?;
    reporter.finish_scan(side, tree.total_files, tree.total_dirs, tree.skipped.len());
    log::debug!("Scanned {} in {:?}", side, tree.scan_duration);
    Ok(tree)
}

/// Write every label's artifacts and the category indexes; returns the binary update labels
fn build_previews(
    layout: &PreviewLayout,
    labels: &LabelRegistry,
    config: &Config,
) -> Result<Vec<String>, SyncError> {
    let mut folder_rows = Vec::new();
    for target in labels.labels_of(LabelKind::Folder) {
        let detail = match write_folder_preview(layout, &target, &config.new_project, &config.ignore_dirs) {
            Ok(files) => format!("{} files", files),
            Err(e) => preview_failed(&target.label, &e),
        };
        folder_rows.push(IndexRow {
            label: target.label,
            path: format!("{}/", target.path),
            detail,
        });
    }
    write_category_index(layout, LabelKind::Folder, &folder_rows)?;

    let mut file_rows = Vec::new();
    for target in labels.labels_of(LabelKind::NewFile) {
        let detail = match write_file_preview(layout, &target, &config.old_project, &config.new_project) {
            Ok(size) => HumanBytes(size).to_string(),
            Err(e) => preview_failed(&target.label, &e),
        };
        file_rows.push(IndexRow {
            label: target.label,
            path: target.path,
            detail,
        });
    }
    write_category_index(layout, LabelKind::NewFile, &file_rows)?;

    let mut binary_updates = Vec::new();
    let mut update_rows = Vec::new();
    for target in labels.labels_of(LabelKind::Update) {
        let detail = match write_update_preview(
            layout,
            &target,
            &config.old_project,
            &config.new_project,
            config.context_lines,
        ) {
            Ok(diff) => {
                if diff.is_binary() {
                    binary_updates.push(target.label.clone());
                }
                update_detail(&diff)
            }
            Err(e) => preview_failed(&target.label, &e),
        };
        update_rows.push(IndexRow {
            label: target.label,
            path: target.path,
            detail,
        });
    }
    write_category_index(layout, LabelKind::Update, &update_rows)?;

    Ok(binary_updates)
}

fn preview_failed(label: &str, error: &SyncError) -> String {
    log::warn!("{}: preview failed: {}", label, error);
    "preview failed".to_string()
}

fn format_statistics(stats: &Statistics, changes: &ChangeSet) -> String {
    let mut lines = vec![
        format!("{}", style("Analysis complete").green().bold()),
        format!("  New folders:     {}", stats.new_folders),
        format!("  New files:       {}", stats.new_files),
        format!("  Updated files:   {}", stats.updated_files),
        format!("  Deleted folders: {}", stats.deleted_folders),
        format!("  Deleted files:   {}", stats.deleted_files),
        format!("  Unchanged files: {}", stats.identical_files),
    ];
    if changes.is_unchanged() {
        lines.push("Both projects are identical.".to_string());
    }
    lines.join("\n")
}
