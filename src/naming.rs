//! Collision-free destination naming.

use std::path::{Path, PathBuf};

/// Returns a path under `dest_dir` for `filename` that does not currently
/// exist on disk.
///
/// The first candidate is `dest_dir/filename`. While the candidate exists the
/// name is rebuilt as `{stem}_{counter}{ext}`, or `{stem}_{suffix}{counter}{ext}`
/// when a disambiguation suffix is supplied (restore tags returned items with
/// `"restored"`). The counter starts at 1 and existence is re-checked after
/// every increment; the filesystem is the source of truth, so no candidate is
/// cached across calls.
pub fn unique_path(dest_dir: &Path, filename: &str, suffix: &str) -> PathBuf {
    let candidate = dest_dir.join(filename);
    if !candidate.exists() {
        return candidate;
    }

    let (stem, ext) = split_name(filename);
    let mut counter: u32 = 1;
    loop {
        let insert = if suffix.is_empty() {
            format!("_{}", counter)
        } else {
            format!("_{}{}", suffix, counter)
        };
        let candidate = dest_dir.join(format!("{}{}{}", stem, insert, ext));
        if !candidate.exists() {
            return candidate;
        }
        counter += 1;
    }
}

/// Splits `filename` into stem and extension, the extension keeping its dot.
/// A leading dot does not start an extension, so dotfiles keep their full
/// name as the stem.
fn split_name(filename: &str) -> (&str, &str) {
    match filename.rfind('.') {
        Some(idx) if idx > 0 => filename.split_at(idx),
        _ => (filename, ""),
    }
}
