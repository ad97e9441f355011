//! End-to-end tests driving the organize and restore engines against real
//! temporary directories, with the application's own files living inside the
//! directory being organized so the self-protection paths are exercised.

use aisort::config::{AppPaths, NO_ARCHIVE_SENTINEL, RunConfig};
use aisort::history::HistoryDb;
use aisort::organizer::Organizer;
use aisort::restorer::Restorer;
use aisort::rules::{FALLBACK_CATEGORY, RuleStore};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// One self-contained workspace: a source directory whose config, rules and
/// history files live inside it, as they would for a portable install.
struct Workspace {
    _temp: TempDir,
    root: PathBuf,
    paths: AppPaths,
    config: RunConfig,
    history: HistoryDb,
}

impl Workspace {
    fn new(archive_name: &str) -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        // Canonicalize up front so path comparisons match the engine's view.
        let root = fs::canonicalize(temp.path()).expect("Failed to canonicalize");
        let paths = AppPaths::in_dir(&root);
        let config = RunConfig {
            archive_name: archive_name.to_string(),
            retention_count: 100,
            ..Default::default()
        };
        let history = HistoryDb::open(&paths.db_file).expect("Failed to open history db");
        Self {
            _temp: temp,
            root,
            paths,
            config,
            history,
        }
    }

    fn write_file(&self, name: &str) -> PathBuf {
        let path = self.root.join(name);
        fs::write(&path, "content").expect("Failed to write file");
        path
    }

    fn organize(&self, rules: &RuleStore, dry_run: bool) -> aisort::OrganizeSummary {
        Organizer::new(
            &self.config,
            rules,
            &self.history,
            &self.paths,
            &self.root,
            None,
            dry_run,
        )
        .run()
        .expect("Organize run failed")
    }

    fn restore(&self, rules: &RuleStore) -> aisort::RestoreSummary {
        Restorer::new(&self.config, rules, &self.history, &self.root)
            .run()
            .expect("Restore run failed")
    }
}

fn image_rules() -> RuleStore {
    RuleStore::from_pairs([("images", vec![".png"])])
}

fn entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .expect("Failed to read dir")
        .flatten()
        .map(|e| e.file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}

#[test]
fn test_organize_with_archive_root() {
    let ws = Workspace::new("Archive");
    let rules = image_rules();
    ws.write_file("photo.png");
    ws.write_file("notes.txt");
    // Pre-existing empty archive root must be left alone as an item.
    fs::create_dir(ws.root.join("Archive")).expect("Failed to create archive");

    let summary = ws.organize(&rules, false);

    assert_eq!(summary.items_processed, 2);
    assert_eq!(summary.items_failed, 0);
    assert!(ws.root.join("Archive").join("images").join("photo.png").exists());
    assert!(
        ws.root
            .join("Archive")
            .join(FALLBACK_CATEGORY)
            .join("notes.txt")
            .exists()
    );
    assert!(!ws.root.join("photo.png").exists());
    assert!(!ws.root.join("notes.txt").exists());

    // Two success records, and the archive root never shows up as a moved item.
    let records = ws.history.recent(10).expect("Failed to read history");
    assert_eq!(records.len(), 2);
    for record in &records {
        assert_eq!(record.action, "organize");
        assert_eq!(record.status, "SUCCESS");
        assert_ne!(record.filename, "Archive");
    }
}

#[test]
fn test_organize_without_archive_root() {
    let ws = Workspace::new(NO_ARCHIVE_SENTINEL);
    let rules = image_rules();
    ws.write_file("photo.png");

    ws.organize(&rules, false);

    assert!(ws.root.join("images").join("photo.png").exists());
    assert!(!ws.root.join("Archive").exists());
}

#[test]
fn test_dry_run_changes_nothing_and_writes_no_history() {
    let ws = Workspace::new("Archive");
    let rules = image_rules();
    ws.write_file("photo.png");
    ws.write_file("notes.txt");

    let summary = ws.organize(&rules, true);

    // Intended moves are reported, nothing is touched.
    assert_eq!(summary.items_processed, 2);
    assert!(ws.root.join("photo.png").exists());
    assert!(ws.root.join("notes.txt").exists());
    assert!(!ws.root.join("Archive").exists());
    assert!(ws.history.recent(10).expect("Failed to read history").is_empty());
}

#[test]
fn test_own_files_are_never_moved() {
    let ws = Workspace::new("Archive");
    let rules = image_rules();
    // config.toml, rules.json, history.db and aisort.log all sit in the
    // source directory; .toml/.json would otherwise keyword/extension match.
    ws.config.save(&ws.paths.config_file).expect("Failed to save config");
    rules.save(&ws.paths.rules_file).expect("Failed to save rules");
    fs::write(&ws.paths.log_file, "").expect("Failed to write log file");
    ws.write_file("movable.txt");

    ws.organize(&rules, false);

    assert!(ws.paths.config_file.exists());
    assert!(ws.paths.rules_file.exists());
    assert!(ws.paths.db_file.exists());
    assert!(ws.paths.log_file.exists());
    assert!(!ws.root.join("movable.txt").exists());

    let records = ws.history.recent(50).expect("Failed to read history");
    for record in &records {
        assert!(!record.source_path.ends_with("config.toml"));
        assert!(!record.source_path.ends_with("rules.json"));
        assert!(!record.source_path.ends_with("history.db"));
        assert!(!record.source_path.ends_with("aisort.log"));
    }
}

#[test]
fn test_category_named_folders_are_skipped() {
    let ws = Workspace::new("Archive");
    let rules = image_rules();
    // A folder carrying a category name must not be organized, even though
    // the archive root (and thus its path-based exclusion) already exists.
    fs::create_dir(ws.root.join("images")).expect("Failed to create dir");
    fs::write(ws.root.join("images").join("inner.png"), "x").expect("Failed to write");

    let summary = ws.organize(&rules, false);

    assert_eq!(summary.items_processed, 0);
    assert!(ws.root.join("images").join("inner.png").exists());
}

#[test]
fn test_loop_prevention_skips_self_nested_destination() {
    // Category "docs/old" resolves to a destination nested inside the
    // directory "docs" that the keyword pattern classifies there.
    let ws = Workspace::new(NO_ARCHIVE_SENTINEL);
    let rules = RuleStore::from_pairs([("docs/old", vec!["docs"])]);
    fs::create_dir(ws.root.join("docs")).expect("Failed to create dir");
    fs::write(ws.root.join("docs").join("keep.txt"), "x").expect("Failed to write");

    let summary = ws.organize(&rules, false);

    assert_eq!(summary.items_skipped, 1);
    assert_eq!(summary.items_processed, 0);
    assert!(ws.root.join("docs").join("keep.txt").exists());
    // Skips are observational only, never history records.
    assert!(ws.history.recent(10).expect("Failed to read history").is_empty());
}

#[test]
fn test_colliding_names_get_increasing_counters() {
    let ws = Workspace::new(NO_ARCHIVE_SENTINEL);
    let rules = image_rules();
    let dest = ws.root.join("images");
    fs::create_dir(&dest).expect("Failed to create dir");
    fs::write(dest.join("photo.png"), "already there").expect("Failed to write");
    fs::write(dest.join("photo_1.png"), "also there").expect("Failed to write");
    ws.write_file("photo.png");

    ws.organize(&rules, false);

    assert!(dest.join("photo_2.png").exists());
}

#[test]
fn test_restore_after_organize_returns_everything() {
    let ws = Workspace::new("Archive");
    let rules = image_rules();
    ws.write_file("photo.png");
    ws.write_file("notes.txt");
    fs::create_dir(ws.root.join("project")).expect("Failed to create dir");
    fs::write(ws.root.join("project").join("main.rs"), "fn main() {}")
        .expect("Failed to write");

    let organized = ws.organize(&rules, false);
    assert_eq!(organized.items_processed, 3);

    let restored = ws.restore(&rules);
    assert_eq!(restored.items_restored, 3);
    assert_eq!(restored.items_failed, 0);

    assert!(ws.root.join("photo.png").exists());
    assert!(ws.root.join("notes.txt").exists());
    assert!(ws.root.join("project").join("main.rs").exists());
    // No empty category or archive folders are left behind.
    assert!(!ws.root.join("Archive").exists());

    let records = ws.history.recent(10).expect("Failed to read history");
    assert_eq!(records.iter().filter(|r| r.action == "restore").count(), 3);
}

#[test]
fn test_restore_collision_gets_restored_suffix() {
    let ws = Workspace::new("Archive");
    let rules = image_rules();
    ws.write_file("photo.png");
    ws.organize(&rules, false);

    // A new file with the same name appeared at the root since organizing.
    ws.write_file("photo.png");
    ws.restore(&rules);

    assert!(ws.root.join("photo.png").exists());
    assert!(ws.root.join("photo_restored1.png").exists());
}

#[test]
fn test_restore_without_candidates_is_a_normal_zero_outcome() {
    let ws = Workspace::new("Archive");
    let rules = image_rules();

    let summary = ws.restore(&rules);
    assert_eq!(summary.items_restored, 0);
    assert_eq!(summary.items_failed, 0);
}

#[test]
fn test_restore_prefers_existing_archive_root() {
    let ws = Workspace::new("Archive");
    let rules = image_rules();
    // Both an archive-nested and a top-level category folder exist; only the
    // archive set is scanned.
    fs::create_dir_all(ws.root.join("Archive").join("images")).expect("Failed to create");
    fs::write(
        ws.root.join("Archive").join("images").join("in_archive.png"),
        "x",
    )
    .expect("Failed to write");
    fs::create_dir(ws.root.join("images")).expect("Failed to create");
    fs::write(ws.root.join("images").join("top_level.png"), "x").expect("Failed to write");

    let summary = ws.restore(&rules);

    assert_eq!(summary.items_restored, 1);
    assert!(ws.root.join("in_archive.png").exists());
    assert!(ws.root.join("images").join("top_level.png").exists());
    assert!(!ws.root.join("Archive").exists());
}

#[test]
fn test_restore_falls_back_to_top_level_category_folders() {
    let ws = Workspace::new("Archive");
    let rules = image_rules();
    // No archive root on disk: known category folders at top level qualify.
    fs::create_dir(ws.root.join("images")).expect("Failed to create");
    fs::write(ws.root.join("images").join("photo.png"), "x").expect("Failed to write");
    // An unknown folder name is not a candidate.
    fs::create_dir(ws.root.join("random")).expect("Failed to create");
    fs::write(ws.root.join("random").join("file.txt"), "x").expect("Failed to write");

    let summary = ws.restore(&rules);

    assert_eq!(summary.items_restored, 1);
    assert!(ws.root.join("photo.png").exists());
    assert!(!ws.root.join("images").exists());
    assert!(ws.root.join("random").join("file.txt").exists());
}

#[test]
fn test_retention_trims_after_organize() {
    let mut ws = Workspace::new("Archive");
    ws.config.retention_count = 2;
    let rules = image_rules();

    // Five pre-existing records.
    for i in 0..5 {
        ws.history
            .append(
                aisort::HistoryAction::Organize,
                aisort::ItemKind::File,
                &format!("old{}.txt", i),
                Path::new("/old/src"),
                Path::new("/old/dst"),
                "SUCCESS",
            )
            .expect("Failed to append");
    }

    // The run adds one success record, then trims to the 2 newest by id.
    ws.write_file("photo.png");
    ws.organize(&rules, false);

    let records = ws.history.recent(10).expect("Failed to read history");
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].filename, "photo.png");
    assert_eq!(records[1].filename, "old4.txt");
    assert!(records[0].id > records[1].id);
}

#[test]
fn test_retention_runs_even_in_dry_run() {
    let mut ws = Workspace::new("Archive");
    ws.config.retention_count = 1;
    let rules = image_rules();

    for i in 0..3 {
        ws.history
            .append(
                aisort::HistoryAction::Organize,
                aisort::ItemKind::File,
                &format!("old{}.txt", i),
                Path::new("/old/src"),
                Path::new("/old/dst"),
                "SUCCESS",
            )
            .expect("Failed to append");
    }

    ws.write_file("photo.png");
    ws.organize(&rules, true);

    let records = ws.history.recent(10).expect("Failed to read history");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].filename, "old2.txt");
}

#[test]
fn test_folders_are_classified_by_keyword() {
    let ws = Workspace::new("Archive");
    let rules = RuleStore::from_pairs([("10_images", vec![".png", "photo"])]);
    fs::create_dir(ws.root.join("My Photos 2024")).expect("Failed to create");

    ws.organize(&rules, false);

    assert!(
        ws.root
            .join("Archive")
            .join("10_images")
            .join("My Photos 2024")
            .exists()
    );
}

#[test]
fn test_unmatched_items_land_in_fallback() {
    let ws = Workspace::new("Archive");
    let rules = image_rules();
    ws.write_file("mystery.xyz");
    fs::create_dir(ws.root.join("unremarkable")).expect("Failed to create");

    ws.organize(&rules, false);

    let fallback = ws.root.join("Archive").join(FALLBACK_CATEGORY);
    assert_eq!(entries(&fallback), vec!["mystery.xyz", "unremarkable"]);
}

#[test]
fn test_organize_fails_fast_on_missing_source() {
    let ws = Workspace::new("Archive");
    let rules = image_rules();
    let missing = ws.root.join("does-not-exist");

    let result = Organizer::new(
        &ws.config,
        &rules,
        &ws.history,
        &ws.paths,
        &missing,
        None,
        false,
    )
    .run();

    assert!(result.is_err());
}

#[test]
fn test_export_after_runs_produces_csv() {
    let ws = Workspace::new("Archive");
    let rules = image_rules();
    ws.write_file("photo.png");
    ws.organize(&rules, false);

    let csv_path = ws.history.export_csv(&ws.root).expect("Export failed");
    assert!(csv_path.exists());
    let content = fs::read_to_string(&csv_path).expect("Failed to read csv");
    assert!(content.lines().count() >= 2);
    assert!(content.contains("photo.png"));
}
