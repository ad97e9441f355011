//! Self-protection: paths the engine must never treat as organizable.
//!
//! Computed once per run from the current rule snapshot, so reloaded rules
//! can never leave stale exclusion data behind.

use crate::classify::ScanItem;
use crate::config::AppPaths;
use crate::rules::RuleStore;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// The closed set of absolute paths and bare names the engine skips.
#[derive(Debug)]
pub struct ExclusionFilter {
    paths: HashSet<PathBuf>,
    names: HashSet<String>,
}

impl ExclusionFilter {
    /// Builds the exclusion set for one run over `source_dir`.
    ///
    /// Excluded by path: the running executable, the config/rules/log/db
    /// files, the archive root under the source directory, and every
    /// category folder both at top level and nested under the archive root.
    /// Excluded by bare name: category names and the archive name, which
    /// covers folders the path set cannot predict (e.g. an archive root that
    /// does not exist yet).
    pub fn compute(
        app_paths: &AppPaths,
        archive_name: Option<&str>,
        rules: &RuleStore,
        source_dir: &Path,
    ) -> Self {
        let mut paths = HashSet::new();
        let mut names = HashSet::new();

        if let Some(exe) = &app_paths.current_exe {
            paths.insert(exe.clone());
        }
        paths.insert(app_paths.config_file.clone());
        paths.insert(app_paths.rules_file.clone());
        paths.insert(app_paths.log_file.clone());
        paths.insert(app_paths.db_file.clone());

        if let Some(archive) = archive_name {
            paths.insert(source_dir.join(archive));
            names.insert(archive.to_string());
        }

        for rule in rules.iter() {
            paths.insert(source_dir.join(&rule.name));
            if let Some(archive) = archive_name {
                paths.insert(source_dir.join(archive).join(&rule.name));
            }
            names.insert(rule.name.clone());
        }

        Self { paths, names }
    }

    /// Whether `item` must be left untouched.
    pub fn is_excluded(&self, item: &ScanItem) -> bool {
        self.paths.contains(&item.path) || self.names.contains(&item.name)
    }
}
