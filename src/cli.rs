//! Command-line surface and run orchestration.
//!
//! Parses the action, loads configuration and rules fresh for the
//! invocation, opens the history database and constructs a fresh engine.
//! Every fatal condition is converted into a structured [`RunReport`];
//! nothing panics across this boundary.

use crate::config::{AppPaths, RunConfig};
use crate::history::HistoryDb;
use crate::organizer::Organizer;
use crate::restorer::Restorer;
use crate::rules::RuleStore;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Organize files and folders into category subdirectories, with AI-assisted
/// classification, durable history and one-shot restore.
#[derive(Debug, Parser)]
#[command(name = "aisort", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub action: Action,

    /// Path to a configuration file (defaults to ~/.config/aisort/config.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory to operate on (defaults to the current directory).
    #[arg(long, global = true)]
    pub source_dir: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Action {
    /// Classify and move items into category folders.
    Organize {
        /// Print intended moves without touching the filesystem.
        #[arg(long)]
        dry_run: bool,
        /// API key override for the remote classifier.
        #[arg(long)]
        api_key: Option<String>,
    },
    /// Move previously organized items back to the source root.
    Restore,
    /// Export the move history to a CSV file in the source directory.
    Export,
}

/// Outcome of one CLI invocation, mapped to the process exit code by main.
#[derive(Debug)]
pub struct RunReport {
    pub success: bool,
    pub message: String,
    pub items_processed: usize,
}

impl RunReport {
    fn failure(message: String) -> Self {
        Self {
            success: false,
            message,
            items_processed: 0,
        }
    }
}

/// Executes one action end to end and reports the outcome.
pub fn run_cli(cli: Cli) -> RunReport {
    let paths = match AppPaths::resolve() {
        Ok(paths) => paths,
        Err(e) => return RunReport::failure(format!("Could not resolve app paths: {}", e)),
    };

    // Config and rules are reloaded for every invocation so edits made by
    // external settings collaborators are picked up without stale state.
    let config = match RunConfig::load(cli.config.as_deref(), &paths) {
        Ok(config) => config,
        Err(e) => return RunReport::failure(format!("Could not load configuration: {}", e)),
    };
    let rules = match RuleStore::load(&paths.rules_file) {
        Ok(rules) => rules,
        Err(e) => return RunReport::failure(format!("Could not load rules: {}", e)),
    };
    let history = match HistoryDb::open(&paths.db_file) {
        Ok(history) => history,
        Err(e) => return RunReport::failure(format!("Could not open history database: {}", e)),
    };

    let source_dir = match cli.source_dir {
        Some(dir) => dir,
        None => match std::env::current_dir() {
            Ok(dir) => dir,
            Err(e) => {
                return RunReport::failure(format!("Could not resolve current directory: {}", e));
            }
        },
    };

    match cli.action {
        Action::Organize { dry_run, api_key } => {
            let organizer = Organizer::new(
                &config,
                &rules,
                &history,
                &paths,
                &source_dir,
                api_key.as_deref(),
                dry_run || config.dry_run,
            );
            match organizer.run() {
                Ok(summary) => RunReport {
                    success: true,
                    message: format!("Organized {} items", summary.items_processed),
                    items_processed: summary.items_processed,
                },
                Err(e) => RunReport::failure(format!("Organize failed: {}", e)),
            }
        }
        Action::Restore => {
            let restorer = Restorer::new(&config, &rules, &history, &source_dir);
            match restorer.run() {
                Ok(summary) => RunReport {
                    success: true,
                    message: format!("Restored {} items", summary.items_restored),
                    items_processed: summary.items_restored,
                },
                Err(e) => RunReport::failure(format!("Restore failed: {}", e)),
            }
        }
        Action::Export => match history.export_csv(&source_dir) {
            Ok(path) => RunReport {
                success: true,
                message: format!("History exported to {}", path.display()),
                items_processed: 0,
            },
            Err(e) => RunReport::failure(format!("Export failed: {}", e)),
        },
    }
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
    fn test_parse_organize_flags() {
        let cli = Cli::try_parse_from([
            "aisort",
            "organize",
            "--dry-run",
            "--api-key",
            "sk-test",
            "--source-dir",
            "/tmp/downloads",
        ])
        .expect("parse failed");

        match cli.action {
            Action::Organize { dry_run, api_key } => {
                assert!(dry_run);
                assert_eq!(api_key.as_deref(), Some("sk-test"));
            }
            _ => panic!("expected organize action"),
        }
        assert_eq!(cli.source_dir, Some(PathBuf::from("/tmp/downloads")));
    }

    #[test]
    fn test_parse_restore_and_export() {
        let cli = Cli::try_parse_from(["aisort", "restore"]).expect("parse failed");
        assert!(matches!(cli.action, Action::Restore));

        let cli = Cli::try_parse_from(["aisort", "export"]).expect("parse failed");
        assert!(matches!(cli.action, Action::Export));
    }

    #[test]
    fn test_missing_action_is_rejected() {
        assert!(Cli::try_parse_from(["aisort"]).is_err());
    }
}
