//! Subcommand implementations

pub mod analyze;
pub mod apply;
pub mod inspect;
pub mod review;

use crate::config::{Command, Config};
use crate::labels::preview::PreviewLayout;
use crate::labels::LabelKind;
use crate::state::TrackingState;
use crate::types::SyncError;

/// Dispatch one parsed subcommand
pub fn run(command: Command, config: Config) -> Result<(), SyncError> {
    match command {
        Command::Analyze { old, new } => {
            let config = config.with_projects(&old, &new);
            analyze::run(&config).map(|_| ())
        }
        Command::List => inspect::list(&config),
        Command::ViewDiff { label } => inspect::view_diff(&config, &label),
        Command::SideBySide { label } => inspect::side_by_side(&config, &label),
        Command::SmartDiff { label } => inspect::smart_diff(&config, &label),
        Command::ShowDecisions => inspect::show_decisions(&config),
        Command::AddFolder { label } => apply::apply_one(&config, &label, LabelKind::Folder),
        Command::AddFile { label } => apply::apply_one(&config, &label, LabelKind::NewFile),
        Command::ApplyUpdate { label } => apply::apply_one(&config, &label, LabelKind::Update),
        Command::AddAllFolders => apply::apply_all(&config, LabelKind::Folder),
        Command::AddAllFiles => apply::apply_all(&config, LabelKind::NewFile),
        Command::ApplyAllUpdates => apply::apply_all(&config, LabelKind::Update),
        Command::Apply => apply::apply_reviewed(&config),
        Command::Review { label } => review::review(&config, &label),
        Command::Quick => review::quick(&config),
        Command::Approve { label } => review::approve(&config, &label),
        Command::Reject { label } => review::reject(&config, &label),
        Command::FixDecisions => review::fix_decisions(&config),
    }
}

/// Preview layout and tracking state of the last analysis
pub(crate) fn open_analysis(config: &Config) -> Result<(PreviewLayout, TrackingState), SyncError> {
    let layout = PreviewLayout::new(&config.output_dir);
    let tracking = TrackingState::load(&layout.tracking_file())?;
    Ok((layout, tracking))
}
