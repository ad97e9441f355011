//! Console output formatting.
//!
//! One place for all user-facing output: colored status lines, the per-item
//! progress bar and the category summary table. The engines only ever print
//! through this module.

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;

/// Consistent styling for all CLI output.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Green checkmark line.
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Red cross line, on stderr.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Yellow warning line. Used for per-item skips and best-effort cleanup
    /// failures that never escalate.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Cyan informational line.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    /// Unstyled line.
    pub fn plain(message: &str) {
        println!("{}", message);
    }

    /// Bold section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Yellow `[DRY RUN]` prefixed line for simulated moves.
    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }

    /// Progress bar sized for a per-item move loop.
    pub fn create_progress_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .expect("Invalid progress bar template")
                .progress_chars("█▓░"),
        );
        pb
    }

    /// Per-category item counts, sorted by category name.
    pub fn summary_table(category_counts: &HashMap<String, usize>, total_items: usize) {
        Self::header("SUMMARY");

        let mut categories: Vec<_> = category_counts.iter().collect();
        categories.sort_by_key(|&(name, _)| name);

        let width = categories
            .iter()
            .map(|(name, _)| name.len())
            .max()
            .unwrap_or(0)
            .max(8);

        println!("{:<width$} | {}", "Category".bold(), "Items".bold());
        println!("{}", "-".repeat(width + 10));
        for (category, count) in &categories {
            let word = if **count == 1 { "item" } else { "items" };
            println!(
                "{:<width$} | {} {}",
                category,
                count.to_string().green(),
                word,
            );
        }
        println!("{}", "-".repeat(width + 10));
        println!(
            "{:<width$} | {} {}",
            "Total".bold(),
            total_items.to_string().green().bold(),
            if total_items == 1 { "item" } else { "items" },
        );
    }
}
