//! Apply engine: copies accepted changes into the old project

pub mod backup;
pub mod copy;

pub use backup::{backup_path, ensure_backup, BackupOutcome};
pub use copy::{copy_dir_recursive, copy_file_atomic, write_atomic};

use crate::config::Config;
use crate::labels::preview::PreviewLayout;
use crate::labels::{LabelKind, LabelTarget};
use crate::state::{DecisionStore, TrackingState};
use crate::types::SyncError;
use std::fs;
use std::path::Path;

/// Statistics for one apply run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyStats {
    /// Number of labels in the batch.
    pub total: usize,
    /// Labels whose content was copied into the project.
    pub applied: usize,
    /// Labels left alone because the overwrite was declined.
    pub skipped: usize,
    /// Labels that failed (unknown label, IO error, ...).
    pub failed: usize,
    /// Labels already written by a folder copied earlier in the same run.
    pub covered: usize,
    /// Files written into the project.
    pub files_copied: u64,
    /// Backups created by this run (existing backups are not counted).
    pub backups_created: usize,
}

/// Events emitted while applying labels.
#[derive(Debug)]
pub enum ApplyEvent {
    Start {
        index: usize,
        total: usize,
        label: String,
    },
    Success {
        index: usize,
        total: usize,
        target: LabelTarget,
        files_copied: u64,
        backup: BackupOutcome,
    },
    /// The target exists and the overwrite was declined
    Skipped {
        index: usize,
        total: usize,
        target: LabelTarget,
    },
    /// The target lies inside a folder copied earlier in the batch
    Covered {
        index: usize,
        total: usize,
        target: LabelTarget,
        folder: String,
    },
    /// Label failed but the batch continued.
    Error {
        index: usize,
        total: usize,
        label: String,
        error: SyncError,
    },
    Complete { stats: ApplyStats },
}

/// Optional callback used to receive apply events.
pub type ApplyCallback<'a> = dyn Fn(&ApplyEvent) + 'a;

/// Decides whether an existing folder in the project may be replaced
pub trait OverwritePolicy {
    fn confirm_overwrite(&mut self, target: &LabelTarget, dest: &Path) -> Result<bool, SyncError>;
}

/// Replace existing folders without asking
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysOverwrite;

impl OverwritePolicy for AlwaysOverwrite {
    fn confirm_overwrite(&mut self, _target: &LabelTarget, _dest: &Path) -> Result<bool, SyncError> {
        Ok(true)
    }
}

/// Never replace existing folders
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverOverwrite;

impl OverwritePolicy for NeverOverwrite {
    fn confirm_overwrite(&mut self, _target: &LabelTarget, _dest: &Path) -> Result<bool, SyncError> {
        Ok(false)
    }
}

/// Result of applying one label
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelApplied {
    Applied {
        target: LabelTarget,
        files_copied: u64,
        backup: BackupOutcome,
    },
    Skipped { target: LabelTarget },
}

/// Everything the engine needs to resolve and copy a label
#[derive(Debug, Clone, Copy)]
pub struct ApplyContext<'a> {
    pub tracking: &'a TrackingState,
    pub layout: &'a PreviewLayout,
    pub config: &'a Config,
}

/// Apply every label in the approved bucket, in label order.
///
/// Partial and rejected labels are never touched. A failing label is reported through
/// `on_event` and the batch continues; if any label failed the result is an
/// aggregated `SyncError::Validation`.
pub fn apply_approved(
    store: &DecisionStore,
    ctx: ApplyContext<'_>,
    policy: &mut dyn OverwritePolicy,
    on_event: Option<&ApplyCallback<'_>>,
) -> Result<ApplyStats, SyncError> {
    let labels: Vec<String> = store.approved.keys().cloned().collect();
    apply_batch(&labels, None, ctx, policy, on_event)
}

/// Apply every label of one kind (`add-all-folders`, `add-all-files`, `apply-all-updates`)
pub fn apply_all_of_kind(
    kind: LabelKind,
    ctx: ApplyContext<'_>,
    policy: &mut dyn OverwritePolicy,
    on_event: Option<&ApplyCallback<'_>>,
) -> Result<ApplyStats, SyncError> {
    let labels: Vec<String> = ctx
        .tracking
        .labels
        .labels_of(kind)
        .into_iter()
        .map(|t| t.label)
        .collect();
    apply_batch(&labels, Some(kind), ctx, policy, on_event)
}

/// Apply labels sequentially, continuing on per-label failures.
///
/// Folder labels sort before file labels, and a label whose target lies inside a
/// folder copied earlier in the run is reported as covered instead of being written
/// (and backed up) a second time.
pub fn apply_batch(
    labels: &[String],
    expected_kind: Option<LabelKind>,
    ctx: ApplyContext<'_>,
    policy: &mut dyn OverwritePolicy,
    on_event: Option<&ApplyCallback<'_>>,
) -> Result<ApplyStats, SyncError> {
    let mut sorted: Vec<&String> = labels.iter().collect();
    // F before N before U, then numeric order (`U999` < `U1000`)
    sorted.sort_by_key(|label| (label.chars().next(), label.len(), label.to_string()));

    let mut stats = ApplyStats {
        total: sorted.len(),
        ..Default::default()
    };
    let mut errors: Vec<(String, SyncError)> = Vec::new();
    let mut copied_folders: Vec<String> = Vec::new();

    for (idx, label) in sorted.into_iter().enumerate() {
        let index = idx + 1;
        emit_event(
            on_event,
            ApplyEvent::Start {
                index,
                total: stats.total,
                label: label.clone(),
            },
        );

        if let Some((target, folder)) = covering_folder(label, expected_kind, &copied_folders, ctx) {
            log::info!("{}: already copied with {}", label, folder);
            stats.covered += 1;
            emit_event(
                on_event,
                ApplyEvent::Covered {
                    index,
                    total: stats.total,
                    target,
                    folder: folder.to_string(),
                },
            );
            continue;
        }

        match apply_label(label, expected_kind, ctx, policy) {
            Ok(LabelApplied::Applied {
                target,
                files_copied,
                backup,
            }) => {
                if target.kind == LabelKind::Folder {
                    copied_folders.push(target.path.clone());
                }
                stats.applied += 1;
                stats.files_copied += files_copied;
                if matches!(backup, BackupOutcome::Created(_)) {
                    stats.backups_created += 1;
                }
                emit_event(
                    on_event,
                    ApplyEvent::Success {
                        index,
                        total: stats.total,
                        target,
                        files_copied,
                        backup,
                    },
                );
            }
            Ok(LabelApplied::Skipped { target }) => {
                stats.skipped += 1;
                emit_event(
                    on_event,
                    ApplyEvent::Skipped {
                        index,
                        total: stats.total,
                        target,
                    },
                );
            }
            Err(error) => {
                stats.failed += 1;
                log::warn!("{}: {}", label, error);

                let event = ApplyEvent::Error {
                    index,
                    total: stats.total,
                    label: label.clone(),
                    error,
                };
                emit_event(on_event, &event);
                if let ApplyEvent::Error { error, .. } = event {
                    errors.push((label.clone(), error));
                }
            }
        }
    }

    emit_event(
        on_event,
        ApplyEvent::Complete {
            stats: stats.clone(),
        },
    );

    if errors.is_empty() {
        Ok(stats)
    } else {
        Err(SyncError::Validation(build_error_summary(&errors)))
    }
}

/// Apply a single label.
///
/// With `expected_kind` set, a label of another kind is rejected as invalid (for
/// example `add-file U001`). An existing target file or folder is backed up once
/// before it is replaced.
pub fn apply_label(
    label: &str,
    expected_kind: Option<LabelKind>,
    ctx: ApplyContext<'_>,
    policy: &mut dyn OverwritePolicy,
) -> Result<LabelApplied, SyncError> {
    let target = ctx.tracking.labels.lookup(label)?;
    if expected_kind.map(|kind| kind != target.kind).unwrap_or(false) {
        return Err(SyncError::invalid_label(label));
    }

    let dest = ctx.tracking.old_project.join(&target.path);
    let suffix = &ctx.config.backup_suffix;

    match target.kind {
        LabelKind::Folder => {
            let src = ctx.tracking.new_project.join(&target.path);
            let mut backup = BackupOutcome::NotNeeded;

            if fs::symlink_metadata(&dest).is_ok() {
                if !policy.confirm_overwrite(&target, &dest)? {
                    log::info!("{}: kept existing {}", label, dest.display());
                    return Ok(LabelApplied::Skipped { target });
                }
                backup = ensure_backup(&dest, suffix)?;
                remove_existing(&dest)?;
            }

            let files_copied = copy_dir_recursive(&src, &dest, &ctx.config.ignore_dirs)?;
            Ok(LabelApplied::Applied {
                target,
                files_copied,
                backup,
            })
        }
        LabelKind::NewFile | LabelKind::Update => {
            let src = source_for(&target, ctx);
            let backup = ensure_backup(&dest, suffix)?;
            copy_file_atomic(&src, &dest)?;
            Ok(LabelApplied::Applied {
                target,
                files_copied: 1,
                backup,
            })
        }
    }
}

/// Folder from `copied` that contains the label's target, if any
fn covering_folder<'f>(
    label: &str,
    expected_kind: Option<LabelKind>,
    copied: &'f [String],
    ctx: ApplyContext<'_>,
) -> Option<(LabelTarget, &'f str)> {
    let target = ctx.tracking.labels.lookup(label).ok()?;
    if expected_kind.map(|kind| kind != target.kind).unwrap_or(false) {
        return None;
    }
    let folder = copied.iter().find(|folder| is_within(&target.path, folder))?;
    Some((target, folder.as_str()))
}

fn is_within(path: &str, folder: &str) -> bool {
    path.strip_prefix(folder)
        .map(|rest| rest.starts_with('/'))
        .unwrap_or(false)
}

/// Updates prefer the reviewed `file.NEW` from the preview area
fn source_for(target: &LabelTarget, ctx: ApplyContext<'_>) -> std::path::PathBuf {
    if target.kind == LabelKind::Update {
        let preview = ctx.layout.update_artifacts(&target.label).new_version();
        if preview.is_file() {
            return preview;
        }
    }
    ctx.tracking.new_project.join(&target.path)
}

fn remove_existing(path: &Path) -> Result<(), SyncError> {
    let metadata = fs::symlink_metadata(path).map_err(|e| SyncError::from_io(path, e))?;
    if metadata.is_dir() {
        fs::remove_dir_all(path).map_err(|e| SyncError::from_io(path, e))
    } else {
        fs::remove_file(path).map_err(|e| SyncError::from_io(path, e))
    }
}

fn emit_event<E: std::borrow::Borrow<ApplyEvent>>(on_event: Option<&ApplyCallback<'_>>, event: E) {
    if let Some(callback) = on_event {
        callback(event.borrow());
    }
}

fn build_error_summary(errors: &[(String, SyncError)]) -> String {
    let preview = errors
        .iter()
        .take(3)
        .map(|(label, err)| format!("{}: {}", label, err))
        .collect::<Vec<_>>()
        .join("; ");

    format!(
        "Apply completed with {} error(s). Example failures: {}",
        errors.len(),
        preview
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels::LabelRegistry;
    use crate::state::ReviewDecision;
    use crate::types::Statistics;
    use std::cell::RefCell;
    use std::path::PathBuf;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        old: PathBuf,
        tracking: TrackingState,
        layout: PreviewLayout,
        config: Config,
    }

    impl Fixture {
        fn ctx(&self) -> ApplyContext<'_> {
            ApplyContext {
                tracking: &self.tracking,
                layout: &self.layout,
                config: &self.config,
            }
        }
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().expect("create tempdir");
        let old = dir.path().join("old");
        let new = dir.path().join("new");
        fs::create_dir_all(old.join("ui")).expect("old ui");
        fs::create_dir_all(new.join("ui")).expect("new ui");
        fs::create_dir_all(new.join("pages/home")).expect("new pages");
        fs::write(old.join("a.ts"), "X").expect("old a");
        fs::write(new.join("a.ts"), "Y").expect("new a");
        fs::write(new.join("b.ts"), "B").expect("new b");
        fs::write(old.join("ui/button.ts"), "old button").expect("old button");
        fs::write(new.join("ui/button.ts"), "new button").expect("new button");
        fs::write(new.join("pages/home/index.ts"), "home").expect("new page");

        let mut labels = LabelRegistry::default();
        labels.updates.insert("U001".to_string(), "a.ts".to_string());
        labels.files.insert("N001".to_string(), "b.ts".to_string());
        labels.folders.insert("F001".to_string(), "pages".to_string());
        labels.folders.insert("F002".to_string(), "ui".to_string());

        let tracking = TrackingState::new(old.clone(), new, Statistics::default(), labels);
        let layout = PreviewLayout::new(dir.path().join("out"));

        Fixture {
            _dir: dir,
            old,
            tracking,
            layout,
            config: Config::default(),
        }
    }

    #[test]
    fn test_update_creates_backup_then_copies() {
        let fx = fixture();
        let result = apply_label("U001", Some(LabelKind::Update), fx.ctx(), &mut NeverOverwrite)
            .expect("apply");

        assert!(matches!(
            result,
            LabelApplied::Applied {
                backup: BackupOutcome::Created(_),
                ..
            }
        ));
        assert_eq!(fs::read_to_string(fx.old.join("a.ts")).expect("read a"), "Y");
        assert_eq!(fs::read_to_string(fx.old.join("a.ts.backup")).expect("read backup"), "X");
    }

    #[test]
    fn test_reapply_is_idempotent() {
        let fx = fixture();
        apply_label("U001", None, fx.ctx(), &mut NeverOverwrite).expect("first apply");
        let second = apply_label("U001", None, fx.ctx(), &mut NeverOverwrite).expect("second apply");

        assert!(matches!(
            second,
            LabelApplied::Applied {
                backup: BackupOutcome::Kept(_),
                ..
            }
        ));
        assert_eq!(fs::read_to_string(fx.old.join("a.ts")).expect("read a"), "Y");
        assert_eq!(fs::read_to_string(fx.old.join("a.ts.backup")).expect("read backup"), "X");
        assert!(!fx.old.join("a.ts.backup.backup").exists());
    }

    #[test]
    fn test_update_prefers_preview_new_file() {
        let fx = fixture();
        let artifacts = fx.layout.update_artifacts("U001");
        write_atomic(&artifacts.new_version(), b"reviewed").expect("write preview");

        apply_label("U001", None, fx.ctx(), &mut NeverOverwrite).expect("apply");
        assert_eq!(fs::read_to_string(fx.old.join("a.ts")).expect("read a"), "reviewed");
    }

    #[test]
    fn test_wrong_kind_is_invalid_label() {
        let fx = fixture();
        let err = apply_label("U001", Some(LabelKind::NewFile), fx.ctx(), &mut NeverOverwrite)
            .unwrap_err();
        assert!(err.is_invalid_reference());
        assert_eq!(fs::read_to_string(fx.old.join("a.ts")).expect("read a"), "X");
    }

    #[test]
    fn test_new_folder_copied_recursively() {
        let fx = fixture();
        let result = apply_label("F001", Some(LabelKind::Folder), fx.ctx(), &mut NeverOverwrite)
            .expect("apply folder");

        assert!(matches!(result, LabelApplied::Applied { files_copied: 1, .. }));
        assert!(fx.old.join("pages/home/index.ts").exists());
    }

    #[test]
    fn test_existing_folder_declined_is_skipped() {
        let fx = fixture();
        let result = apply_label("F002", None, fx.ctx(), &mut NeverOverwrite).expect("apply");

        assert!(matches!(result, LabelApplied::Skipped { .. }));
        assert_eq!(
            fs::read_to_string(fx.old.join("ui/button.ts")).expect("read"),
            "old button"
        );
    }

    #[test]
    fn test_existing_folder_overwritten_with_backup() {
        let fx = fixture();
        apply_label("F002", None, fx.ctx(), &mut AlwaysOverwrite).expect("apply");

        assert_eq!(
            fs::read_to_string(fx.old.join("ui/button.ts")).expect("read"),
            "new button"
        );
        assert_eq!(
            fs::read_to_string(fx.old.join("ui.backup/button.ts")).expect("read backup"),
            "old button"
        );
    }

    #[test]
    fn test_apply_approved_only_touches_approved_bucket() {
        let fx = fixture();
        let mut store = DecisionStore::new();
        store.record_decision("N001", ReviewDecision::Approved("b.ts".to_string()));
        store.record_decision("U001", ReviewDecision::Rejected("a.ts".to_string()));

        let stats = apply_approved(&store, fx.ctx(), &mut NeverOverwrite, None).expect("apply");

        assert_eq!(stats.total, 1);
        assert_eq!(stats.applied, 1);
        assert!(fx.old.join("b.ts").exists());
        assert_eq!(fs::read_to_string(fx.old.join("a.ts")).expect("read a"), "X");
    }

    #[test]
    fn test_unknown_label_fails_but_batch_continues() {
        let fx = fixture();
        let mut store = DecisionStore::new();
        store.record_decision("N001", ReviewDecision::Approved("b.ts".to_string()));
        store.record_decision("U042", ReviewDecision::Approved("gone.ts".to_string()));

        let events = RefCell::new(Vec::new());
        let callback = |event: &ApplyEvent| {
            let name = match event {
                ApplyEvent::Start { .. } => "start",
                ApplyEvent::Success { .. } => "success",
                ApplyEvent::Skipped { .. } => "skipped",
                ApplyEvent::Covered { .. } => "covered",
                ApplyEvent::Error { .. } => "error",
                ApplyEvent::Complete { .. } => "complete",
            };
            events.borrow_mut().push(name);
        };

        let err = apply_approved(&store, fx.ctx(), &mut NeverOverwrite, Some(&callback))
            .unwrap_err();

        assert!(err.to_string().contains("1 error"));
        assert!(fx.old.join("b.ts").exists());
        assert_eq!(
            *events.borrow(),
            vec!["start", "success", "start", "error", "complete"]
        );
    }
}
