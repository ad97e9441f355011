//! The move engine.
//!
//! Enumerates the source directory once, gates every entry through the
//! exclusion filter, classifies it with the strategy chain, resolves a
//! collision-free destination and performs (or simulates) the move. Each
//! attempted move appends one history record. Only an unreadable source
//! directory is fatal; every per-item failure is logged and the loop
//! continues.

use crate::ai::AiClient;
use crate::classify::{ClassifierChain, ScanItem};
use crate::config::{AppPaths, RunConfig};
use crate::exclude::ExclusionFilter;
use crate::history::{HistoryAction, HistoryDb, ItemKind};
use crate::naming::unique_path;
use crate::output::OutputFormatter;
use crate::rules::RuleStore;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Errors that abort or describe a failed move operation.
#[derive(Debug)]
pub enum OrganizeError {
    /// The source directory cannot be enumerated. Fatal.
    SourceDirUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },
    /// A destination category directory could not be created. Per-item.
    DirectoryCreationFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The rename itself failed (permissions, in-use file, cross-device).
    /// Per-item.
    MoveFailed {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },
}

impl std::fmt::Display for OrganizeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SourceDirUnreadable { path, source } => {
                write!(f, "Cannot read source directory {}: {}", path.display(), source)
            }
            Self::DirectoryCreationFailed { path, source } => {
                write!(f, "Failed to create directory {}: {}", path.display(), source)
            }
            Self::MoveFailed { from, to, source } => {
                write!(
                    f,
                    "Failed to move {} to {}: {}",
                    from.display(),
                    to.display(),
                    source
                )
            }
        }
    }
}

impl std::error::Error for OrganizeError {}

/// Result type for engine operations.
pub type OrganizeResult<T> = Result<T, OrganizeError>;

/// Counters for one organize run.
#[derive(Debug, Default, Clone, Copy)]
pub struct OrganizeSummary {
    /// Items moved, or intended moves in dry-run mode.
    pub items_processed: usize,
    /// Items skipped by loop prevention.
    pub items_skipped: usize,
    /// Items whose move failed and was recorded as such.
    pub items_failed: usize,
}

/// Drives one organize run. Constructed fresh per run; holds no state after
/// `run()` returns.
pub struct Organizer<'a> {
    config: &'a RunConfig,
    rules: &'a RuleStore,
    history: &'a HistoryDb,
    app_paths: &'a AppPaths,
    source_dir: PathBuf,
    chain: ClassifierChain,
    dry_run: bool,
}

impl<'a> Organizer<'a> {
    /// Builds the engine, its classification chain and remote client. The
    /// remote strategy is present only when an API key is configured (the
    /// override beats the config file value).
    pub fn new(
        config: &'a RunConfig,
        rules: &'a RuleStore,
        history: &'a HistoryDb,
        app_paths: &'a AppPaths,
        source_dir: &Path,
        api_key_override: Option<&str>,
        dry_run: bool,
    ) -> Self {
        let api_key = api_key_override.unwrap_or(&config.api_key);
        let ai_client = AiClient::new(api_key, &config.base_url, &config.model);
        Self {
            config,
            rules,
            history,
            app_paths,
            source_dir: source_dir.to_path_buf(),
            chain: ClassifierChain::new(ai_client),
            dry_run,
        }
    }

    /// Runs the organize pass and returns per-run counters.
    pub fn run(&self) -> OrganizeResult<OrganizeSummary> {
        let source_dir =
            fs::canonicalize(&self.source_dir).map_err(|e| OrganizeError::SourceDirUnreadable {
                path: self.source_dir.clone(),
                source: e,
            })?;

        OutputFormatter::info(&format!("Organizing contents of: {}", source_dir.display()));
        if self.dry_run {
            OutputFormatter::dry_run_notice("Simulation only, nothing will be moved.");
        }

        // Exclusions are rebuilt from the current rule snapshot every run;
        // stale exclusion data across rule reloads is a defect.
        let exclusions = ExclusionFilter::compute(
            self.app_paths,
            self.config.archive_name(),
            self.rules,
            &source_dir,
        );

        let entries =
            fs::read_dir(&source_dir).map_err(|e| OrganizeError::SourceDirUnreadable {
                path: source_dir.clone(),
                source: e,
            })?;

        let mut items: Vec<ScanItem> = Vec::new();
        for entry in entries.flatten() {
            let item = ScanItem {
                name: entry.file_name().to_string_lossy().to_string(),
                is_dir: entry.file_type().map(|t| t.is_dir()).unwrap_or(false),
                path: entry.path(),
            };
            if !exclusions.is_excluded(&item) {
                items.push(item);
            }
        }

        let pb = OutputFormatter::create_progress_bar(items.len() as u64);
        let mut summary = OrganizeSummary::default();
        let mut category_counts: HashMap<String, usize> = HashMap::new();

        for item in &items {
            pb.inc(1);
            let category = self.chain.classify(item, self.rules);
            let dest_dir = match self.config.archive_name() {
                Some(archive) => source_dir.join(archive).join(&category),
                None => source_dir.join(&category),
            };

            // Loop prevention: a directory whose destination resolves to
            // itself or inside itself is skipped, never attempted.
            if item.is_dir && dest_dir.starts_with(&item.path) {
                pb.suspend(|| {
                    OutputFormatter::warning(&format!(
                        "Skipped '{}': destination is inside the source folder",
                        item.name
                    ));
                });
                summary.items_skipped += 1;
                continue;
            }

            if self.dry_run {
                pb.suspend(|| {
                    OutputFormatter::dry_run_notice(&format!(
                        "{} '{}' -> '{}'",
                        ItemKind::from_is_dir(item.is_dir).as_str(),
                        item.name,
                        category
                    ));
                });
                *category_counts.entry(category).or_insert(0) += 1;
                summary.items_processed += 1;
                continue;
            }

            match self.move_item(item, &dest_dir) {
                Ok(dest_path) => {
                    pb.suspend(|| {
                        OutputFormatter::success(&format!("{} -> {}", item.name, category));
                    });
                    self.record(item, &dest_path, "SUCCESS");
                    *category_counts.entry(category).or_insert(0) += 1;
                    summary.items_processed += 1;
                }
                Err(e) => {
                    pb.suspend(|| {
                        OutputFormatter::error(&format!("{}: {}", item.name, e));
                    });
                    self.record(item, &dest_dir.join(&item.name), &format!("FAIL: {}", e));
                    summary.items_failed += 1;
                }
            }
        }
        pb.finish_and_clear();

        if !category_counts.is_empty() {
            OutputFormatter::summary_table(&category_counts, summary.items_processed);
        }
        OutputFormatter::plain(&format!(
            "Organize complete: {} processed, {} skipped, {} failed.",
            summary.items_processed, summary.items_skipped, summary.items_failed
        ));

        // Retention runs unconditionally, dry-run included.
        if let Err(e) = self.history.trim(self.config.retention_count) {
            OutputFormatter::warning(&format!("Could not trim history: {}", e));
        }

        Ok(summary)
    }

    /// Creates the destination directory if needed and renames the item to a
    /// collision-free path inside it.
    fn move_item(&self, item: &ScanItem, dest_dir: &Path) -> OrganizeResult<PathBuf> {
        if !dest_dir.exists() {
            fs::create_dir_all(dest_dir).map_err(|e| OrganizeError::DirectoryCreationFailed {
                path: dest_dir.to_path_buf(),
                source: e,
            })?;
        }
        let dest_path = unique_path(dest_dir, &item.name, "");
        fs::rename(&item.path, &dest_path).map_err(|e| OrganizeError::MoveFailed {
            from: item.path.clone(),
            to: dest_path.clone(),
            source: e,
        })?;
        Ok(dest_path)
    }

    /// Appends one history record. A failed append is reported but never
    /// stops the loop.
    fn record(&self, item: &ScanItem, dest_path: &Path, status: &str) {
        let result = self.history.append(
            HistoryAction::Organize,
            ItemKind::from_is_dir(item.is_dir),
            &item.name,
            &item.path,
            dest_path,
            status,
        );
        if let Err(e) = result {
            OutputFormatter::warning(&format!("Could not record history: {}", e));
        }
    }
}
