//! The restore engine: inverse of organize.
//!
//! Scans category folders (inside the archive root when it exists, otherwise
//! top-level folders named after known categories — exactly one of the two
//! sets, never both), moves every contained item back to the source root
//! with a `restored` disambiguation suffix, and prunes folders it emptied.

use crate::config::RunConfig;
use crate::history::{HistoryAction, HistoryDb, ItemKind};
use crate::naming::unique_path;
use crate::organizer::{OrganizeError, OrganizeResult};
use crate::output::OutputFormatter;
use crate::rules::RuleStore;
use std::fs;
use std::path::{Path, PathBuf};

/// Suffix inserted into restored filenames on collision.
const RESTORE_SUFFIX: &str = "restored";

/// Counters for one restore run.
#[derive(Debug, Default, Clone, Copy)]
pub struct RestoreSummary {
    /// Items moved back to the source root.
    pub items_restored: usize,
    /// Items whose restore failed and was recorded as such.
    pub items_failed: usize,
}

/// Drives one restore run. Constructed fresh per run.
pub struct Restorer<'a> {
    config: &'a RunConfig,
    rules: &'a RuleStore,
    history: &'a HistoryDb,
    source_dir: PathBuf,
}

impl<'a> Restorer<'a> {
    pub fn new(
        config: &'a RunConfig,
        rules: &'a RuleStore,
        history: &'a HistoryDb,
        source_dir: &Path,
    ) -> Self {
        Self {
            config,
            rules,
            history,
            source_dir: source_dir.to_path_buf(),
        }
    }

    /// Runs the restore pass. Finding no candidate folders is a normal
    /// zero-item outcome, not an error.
    pub fn run(&self) -> OrganizeResult<RestoreSummary> {
        let source_dir =
            fs::canonicalize(&self.source_dir).map_err(|e| OrganizeError::SourceDirUnreadable {
                path: self.source_dir.clone(),
                source: e,
            })?;

        OutputFormatter::info(&format!("Restoring contents of: {}", source_dir.display()));

        let folders = self.candidate_folders(&source_dir);
        if folders.is_empty() {
            OutputFormatter::plain("No category folders found to restore.");
            return Ok(RestoreSummary::default());
        }

        let mut summary = RestoreSummary::default();
        for folder in &folders {
            let folder_name = folder
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            OutputFormatter::plain(&format!("Scanning: {}", folder_name));

            let entries = match fs::read_dir(folder) {
                Ok(entries) => entries,
                Err(e) => {
                    OutputFormatter::warning(&format!(
                        "Cannot read {}: {}",
                        folder.display(),
                        e
                    ));
                    continue;
                }
            };

            for entry in entries.flatten() {
                let name = entry.file_name().to_string_lossy().to_string();
                let src_path = entry.path();
                let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
                let dest_path = unique_path(&source_dir, &name, RESTORE_SUFFIX);

                match fs::rename(&src_path, &dest_path) {
                    Ok(()) => {
                        OutputFormatter::success(&format!("Restored: {}", name));
                        self.record(is_dir, &name, &src_path, &dest_path, "SUCCESS");
                        summary.items_restored += 1;
                    }
                    Err(e) => {
                        OutputFormatter::error(&format!("Failed to restore {}: {}", name, e));
                        self.record(
                            is_dir,
                            &name,
                            &src_path,
                            &dest_path,
                            &format!("FAIL: {}", e),
                        );
                        summary.items_failed += 1;
                    }
                }
            }

            remove_if_empty(folder);
        }

        // The emptied archive root goes last, best-effort like the rest.
        if let Some(archive) = self.config.archive_name() {
            remove_if_empty(&source_dir.join(archive));
        }

        OutputFormatter::plain(&format!(
            "Restore complete: {} restored, {} failed.",
            summary.items_restored, summary.items_failed
        ));

        if let Err(e) = self.history.trim(self.config.retention_count) {
            OutputFormatter::warning(&format!("Could not trim history: {}", e));
        }

        Ok(summary)
    }

    /// Picks the folder set to drain. An existing archive root wins and its
    /// immediate subfolders are taken as-is; otherwise only top-level
    /// folders named after known categories qualify. The two sets are never
    /// merged, which would risk double-restoring items.
    fn candidate_folders(&self, source_dir: &Path) -> Vec<PathBuf> {
        let mut folders = Vec::new();

        if let Some(archive) = self.config.archive_name() {
            let archive_path = source_dir.join(archive);
            if archive_path.is_dir() {
                if let Ok(entries) = fs::read_dir(&archive_path) {
                    for entry in entries.flatten() {
                        let path = entry.path();
                        if path.is_dir() {
                            folders.push(path);
                        }
                    }
                }
                return folders;
            }
        }

        for rule in self.rules.iter() {
            let cat_path = source_dir.join(&rule.name);
            if cat_path.is_dir() {
                folders.push(cat_path);
            }
        }
        folders
    }

    fn record(&self, is_dir: bool, name: &str, src: &Path, dest: &Path, status: &str) {
        let result = self.history.append(
            HistoryAction::Restore,
            ItemKind::from_is_dir(is_dir),
            name,
            src,
            dest,
            status,
        );
        if let Err(e) = result {
            OutputFormatter::warning(&format!("Could not record history: {}", e));
        }
    }
}

/// Best-effort housekeeping: removes `dir` only when it exists and is empty.
/// Failures are reported at diagnostic level and never escalated.
fn remove_if_empty(dir: &Path) {
    let is_empty = fs::read_dir(dir)
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(false);
    if is_empty {
        if let Err(e) = fs::remove_dir(dir) {
            OutputFormatter::warning(&format!("Could not remove {}: {}", dir.display(), e));
        }
    }
}
