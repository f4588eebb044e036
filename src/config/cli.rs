//! Command-line interface definition

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Compare a project with a fresh export, review every change, apply what you accept.
#[derive(Debug, Parser)]
#[command(name = "treesync", version, about)]
pub struct Cli {
    /// Preview/output directory holding reports, labels and decisions
    #[arg(long, short, global = true, default_value = "./tree-sync")]
    pub output: PathBuf,

    /// Settings file (defaults to ./treesync.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Scan both projects, label every change and build the preview area
    Analyze {
        /// Project that receives the changes
        old: PathBuf,
        /// Fresh export
        new: PathBuf,
    },
    /// List every label from the last analysis
    List,
    /// Print the unified diff of an update label
    ViewDiff { label: String },
    /// Show an update label as OLD | NEW columns
    SideBySide { label: String },
    /// Print a diff headed by the kinds of code it touches (imports, functions, styles)
    SmartDiff { label: String },
    /// Copy a new folder into the project
    AddFolder { label: String },
    /// Copy a new file into the project
    AddFile { label: String },
    /// Overwrite a project file with its updated version (keeps a backup)
    ApplyUpdate { label: String },
    /// Add every new folder
    AddAllFolders,
    /// Add every new file
    AddAllFiles,
    /// Apply every update
    ApplyAllUpdates,
    /// Review one update hunk by hunk
    Review { label: String },
    /// Quick pass over all updates, then offer to apply the approved ones
    Quick,
    /// Mark a label approved without reviewing hunks
    Approve { label: String },
    /// Mark a label rejected
    Reject { label: String },
    /// Apply every approved label
    Apply,
    /// Promote partial reviews that are actually unanimous
    FixDecisions,
    /// Show the current review decisions
    ShowDecisions,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_analyze_with_output() {
        let cli = Cli::parse_from(["treesync", "analyze", "old", "new", "--output", "out"]);
        assert_eq!(cli.output, PathBuf::from("out"));
        match cli.command {
            Command::Analyze { old, new } => {
                assert_eq!(old, PathBuf::from("old"));
                assert_eq!(new, PathBuf::from("new"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_label_commands() {
        let cli = Cli::parse_from(["treesync", "-vv", "apply-update", "U001"]);
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Command::ApplyUpdate { ref label } if label == "U001"));

        let cli = Cli::parse_from(["treesync", "side-by-side", "U002"]);
        assert!(matches!(cli.command, Command::SideBySide { ref label } if label == "U002"));
        let cli = Cli::parse_from(["treesync", "smart-diff", "U003"]);
        assert!(matches!(cli.command, Command::SmartDiff { ref label } if label == "U003"));
    }
}
