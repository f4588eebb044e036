//! Progress reporting

use crate::executor::ApplyStats;
use indicatif::{ProgressBar, ProgressStyle};

/// Spinner for scanning and bar for applying labels
pub struct ProgressReporter {
    scan_bar: ProgressBar,
    apply_bar: ProgressBar,
}

impl ProgressReporter {
    /// Create a new progress reporter
    pub fn new() -> Self {
        let scan_bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
            scan_bar.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ "));
        }

        Self::with_bars(scan_bar, ProgressBar::new(0))
    }

    /// Reporter that draws nothing (non-interactive runs and tests)
    pub fn hidden() -> Self {
        Self::with_bars(ProgressBar::hidden(), ProgressBar::hidden())
    }

    fn with_bars(scan_bar: ProgressBar, apply_bar: ProgressBar) -> Self {
        if let Ok(style) = ProgressStyle::with_template("{bar:30.cyan/blue} {pos}/{len} labels | {msg}")
        {
            apply_bar.set_style(style.progress_chars("=>-"));
        }
        Self {
            scan_bar,
            apply_bar,
        }
    }

    /// Mark start of a scanning phase.
    pub fn start_scan(&self, side: &str) {
        self.scan_bar
            .enable_steady_tick(std::time::Duration::from_millis(120));
        self.scan_bar.set_message(format!("Scanning {}...", side));
    }

    /// Update scanning progress counters.
    pub fn update_scan(&self, side: &str, files: u64, dirs: u64) {
        self.scan_bar.set_message(format!(
            "Scanning {}... {} files | {} folders",
            side, files, dirs
        ));
    }

    /// Mark completion of a scanning phase.
    pub fn finish_scan(&self, side: &str, files: usize, dirs: usize, skipped: usize) {
        let mut message = format!("Scanned {}: {} files | {} folders", side, files, dirs);
        if skipped > 0 {
            message.push_str(&format!(" | {} unreadable", skipped));
        }
        self.scan_bar.set_message(message);
    }

    /// Stop the spinner and leave the last message on screen
    pub fn end_scanning(&self) {
        self.scan_bar.finish();
    }

    /// Initialize apply phase progress.
    pub fn start_apply(&self, total_labels: u64) {
        self.apply_bar.set_length(total_labels);
        self.apply_bar.set_position(0);
        self.apply_bar.set_message("Starting...".to_string());
    }

    /// Update current label indicator.
    pub fn set_current_label(&self, label: &str) {
        self.apply_bar.set_message(format!("Applying {}", label));
    }

    /// Mark one label as handled (applied or skipped).
    pub fn complete_label(&self, line: String) {
        self.apply_bar.inc(1);
        self.apply_bar.println(line);
    }

    /// Surface a label error in apply phase.
    pub fn apply_error(&self, label: &str, err: &str) {
        self.apply_bar.inc(1);
        self.apply_bar.println(format!("ERROR {}: {}", label, err));
    }

    /// Hide the bar while `f` talks to the terminal
    pub fn suspend<F: FnOnce() -> R, R>(&self, f: F) -> R {
        self.apply_bar.suspend(f)
    }

    /// Finalize apply phase.
    pub fn finish_apply(&self, stats: &ApplyStats) {
        self.apply_bar.finish_with_message(format!(
            "Apply complete: {} applied, {} skipped, {} failed | {} files written | {} backups",
            stats.applied + stats.covered,
            stats.skipped,
            stats.failed,
            stats.files_copied,
            stats.backups_created
        ));
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}
