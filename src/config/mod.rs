//! Configuration management

mod cli;

pub use cli::{Cli, Command};

use crate::types::SyncError;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the optional settings file looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "treesync.toml";

/// Global configuration for treesync
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Project that receives approved changes
    pub old_project: PathBuf,

    /// Fresh export the changes come from
    pub new_project: PathBuf,

    /// Preview area (reports, labelled artifacts, decision files)
    pub output_dir: PathBuf,

    /// Directory names pruned from every scan
    pub ignore_dirs: Vec<String>,

    /// File-name globs skipped by the scanner
    pub exclude_patterns: Vec<String>,

    /// Skip files whose name starts with `.`
    pub skip_hidden_files: bool,

    /// Context lines around each diff hunk
    pub context_lines: usize,

    /// Suffix appended to a file name for its pre-overwrite backup
    pub backup_suffix: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            old_project: PathBuf::new(),
            new_project: PathBuf::new(),
            output_dir: PathBuf::from("./tree-sync"),
            ignore_dirs: ["node_modules", ".next", "dist", ".git", "build"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            exclude_patterns: vec!["*.pyc".to_string(), "*.log".to_string()],
            skip_hidden_files: true,
            context_lines: 3,
            backup_suffix: ".backup".to_string(),
        }
    }
}

/// Overrides read from `treesync.toml`; every key is optional
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct Settings {
    ignore_dirs: Option<Vec<String>>,
    exclude_patterns: Option<Vec<String>>,
    skip_hidden_files: Option<bool>,
    context_lines: Option<usize>,
    backup_suffix: Option<String>,
}

impl Config {
    /// Build a config for an output directory, applying a settings file if one is found.
    ///
    /// An explicit `settings_path` must exist. Without one, `treesync.toml` in the
    /// working directory is used when present.
    pub fn load(output_dir: &Path, settings_path: Option<&Path>) -> Result<Self, SyncError> {
        let mut config = Config {
            output_dir: output_dir.to_path_buf(),
            ..Config::default()
        };

        match settings_path {
            Some(path) => config.apply_settings_file(path)?,
            None => {
                let default_path = Path::new(CONFIG_FILE_NAME);
                if default_path.is_file() {
                    config.apply_settings_file(default_path)?;
                }
            }
        }

        Ok(config)
    }

    /// Set the two project roots
    pub fn with_projects(mut self, old_project: &Path, new_project: &Path) -> Self {
        self.old_project = old_project.to_path_buf();
        self.new_project = new_project.to_path_buf();
        self
    }

    fn apply_settings_file(&mut self, path: &Path) -> Result<(), SyncError> {
        let raw = fs::read_to_string(path).map_err(|e| {
            SyncError::Config(format!("Cannot read settings file {}: {}", path.display(), e))
        })?;
        self.apply_settings(&raw)
            .map_err(|e| SyncError::Config(format!("{}: {}", path.display(), e)))
    }

    fn apply_settings(&mut self, raw: &str) -> Result<(), toml::de::Error> {
        let settings: Settings = toml::from_str(raw)?;

        if let Some(dirs) = settings.ignore_dirs {
            self.ignore_dirs = dirs;
        }
        if let Some(patterns) = settings.exclude_patterns {
            self.exclude_patterns = patterns;
        }
        if let Some(skip) = settings.skip_hidden_files {
            self.skip_hidden_files = skip;
        }
        if let Some(lines) = settings.context_lines {
            self.context_lines = lines;
        }
        if let Some(suffix) = settings.backup_suffix {
            self.backup_suffix = suffix;
        }
        Ok(())
    }

    /// Validate configuration before an analysis run
    pub fn validate(&self) -> Result<(), SyncError> {
        if !self.old_project.is_dir() {
            return Err(SyncError::Config(format!(
                "Old project not found: {}",
                self.old_project.display()
            )));
        }

        if !self.new_project.is_dir() {
            return Err(SyncError::Config(format!(
                "New project not found: {}",
                self.new_project.display()
            )));
        }

        if self.old_project == self.new_project {
            return Err(SyncError::Config(
                "Old and new project cannot be the same".to_string(),
            ));
        }

        if self.backup_suffix.is_empty() {
            return Err(SyncError::Config(
                "Backup suffix must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_match_export_layout() {
        let config = Config::default();
        assert!(config.ignore_dirs.contains(&"node_modules".to_string()));
        assert!(config.ignore_dirs.contains(&".git".to_string()));
        assert_eq!(config.context_lines, 3);
        assert_eq!(config.backup_suffix, ".backup");
        assert!(config.skip_hidden_files);
    }

    #[test]
    fn test_settings_override_selected_keys() {
        let mut config = Config::default();
        config
            .apply_settings("ignore_dirs = [\"vendor\"]\ncontext_lines = 5\n")
            .expect("parse settings");

        assert_eq!(config.ignore_dirs, vec!["vendor".to_string()]);
        assert_eq!(config.context_lines, 5);
        assert_eq!(config.backup_suffix, ".backup");
    }

    #[test]
    fn test_settings_reject_unknown_keys() {
        let mut config = Config::default();
        assert!(config.apply_settings("colour = true\n").is_err());
    }

    #[test]
    fn test_load_with_explicit_missing_file_fails() {
        let dir = TempDir::new().expect("create tempdir");
        let result = Config::load(dir.path(), Some(&dir.path().join("nope.toml")));
        assert!(matches!(result, Err(SyncError::Config(_))));
    }

    #[test]
    fn test_load_with_explicit_file() {
        let dir = TempDir::new().expect("create tempdir");
        let settings = dir.path().join("custom.toml");
        fs::write(&settings, "backup_suffix = \".orig\"\n").expect("write settings");

        let config = Config::load(dir.path(), Some(&settings)).expect("load config");
        assert_eq!(config.backup_suffix, ".orig");
        assert_eq!(config.output_dir, dir.path());
    }

    #[test]
    fn test_validate_requires_both_projects() {
        let old = TempDir::new().expect("create old");
        let config = Config::default().with_projects(old.path(), Path::new("/nonexistent/new"));
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("New project not found"));
    }

    #[test]
    fn test_validate_rejects_same_project() {
        let dir = TempDir::new().expect("create tempdir");
        let config = Config::default().with_projects(dir.path(), dir.path());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_accepts_two_directories() {
        let old = TempDir::new().expect("create old");
        let new = TempDir::new().expect("create new");
        let config = Config::default().with_projects(old.path(), new.path());
        assert!(config.validate().is_ok());
    }
}
