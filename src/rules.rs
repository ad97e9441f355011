//! Classification rule store.
//!
//! Rules map a category name to a list of match patterns. A pattern is either
//! a lowercase extension beginning with `.` (matched exactly against a file's
//! suffix) or an arbitrary substring (matched case-insensitively against the
//! item name). Category order is significant: the keyword strategy and the AI
//! response validation both resolve ties in favor of the first declared
//! category, so the store is backed by a `Vec` and the JSON document is parsed
//! with insertion order preserved.

use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// The reserved catch-all category. Always present in a loaded store and
/// returned by the fallback strategy when nothing else matches.
pub const FALLBACK_CATEGORY: &str = "99_misc";

/// Errors that can occur while loading or saving the rules document.
#[derive(Debug)]
pub enum RulesError {
    /// The rules file could not be read or written.
    Io { path: PathBuf, source: std::io::Error },
    /// The rules file is not a JSON object of string arrays.
    InvalidFormat { reason: String },
}

impl std::fmt::Display for RulesError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "Failed to access rules file {}: {}", path.display(), source)
            }
            Self::InvalidFormat { reason } => write!(f, "Invalid rules file: {}", reason),
        }
    }
}

impl std::error::Error for RulesError {}

/// A single category and its match patterns.
#[derive(Debug, Clone)]
pub struct CategoryRule {
    /// Category name, used verbatim as the destination folder name.
    pub name: String,
    /// Extension and keyword patterns for this category.
    pub patterns: Vec<String>,
}

/// Ordered collection of category rules.
///
/// Loaded once per run and read-only while the run is in flight.
#[derive(Debug, Clone)]
pub struct RuleStore {
    categories: Vec<CategoryRule>,
}

impl RuleStore {
    /// Builds a store from `(name, patterns)` pairs, keeping declaration
    /// order. Duplicate names after the first are dropped, and the reserved
    /// fallback category is appended when missing.
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, Vec<S>)>,
        S: Into<String>,
    {
        let mut categories: Vec<CategoryRule> = Vec::new();
        for (name, patterns) in pairs {
            let name = name.into();
            if categories.iter().any(|c| c.name == name) {
                continue;
            }
            categories.push(CategoryRule {
                name,
                patterns: patterns.into_iter().map(Into::into).collect(),
            });
        }
        let mut store = Self { categories };
        store.ensure_fallback();
        store
    }

    /// Loads rules from `path`, writing the default rule set there first if
    /// the file does not exist yet.
    pub fn load(path: &Path) -> Result<Self, RulesError> {
        if !path.exists() {
            let store = Self::default();
            // Best-effort seed of the default document; a read-only config
            // directory still leaves a usable in-memory store.
            let _ = store.save(path);
            return Ok(store);
        }

        let content = fs::read_to_string(path).map_err(|e| RulesError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&content)
    }

    /// Parses a JSON object of `"category": ["pattern", ...]` entries.
    pub fn parse(content: &str) -> Result<Self, RulesError> {
        let value: Value =
            serde_json::from_str(content).map_err(|e| RulesError::InvalidFormat {
                reason: format!("JSON parse error: {}", e),
            })?;

        let object = value.as_object().ok_or_else(|| RulesError::InvalidFormat {
            reason: "top-level value must be an object".to_string(),
        })?;

        let mut categories = Vec::with_capacity(object.len());
        for (name, patterns) in object {
            let list = patterns.as_array().ok_or_else(|| RulesError::InvalidFormat {
                reason: format!("patterns for '{}' must be an array", name),
            })?;
            let patterns = list
                .iter()
                .map(|p| {
                    p.as_str().map(str::to_string).ok_or_else(|| {
                        RulesError::InvalidFormat {
                            reason: format!("patterns for '{}' must be strings", name),
                        }
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            categories.push(CategoryRule {
                name: name.clone(),
                patterns,
            });
        }

        let mut store = Self { categories };
        store.ensure_fallback();
        Ok(store)
    }

    /// Serializes the store back to its JSON document form.
    pub fn save(&self, path: &Path) -> Result<(), RulesError> {
        let mut object = serde_json::Map::new();
        for rule in &self.categories {
            object.insert(
                rule.name.clone(),
                Value::Array(rule.patterns.iter().cloned().map(Value::String).collect()),
            );
        }
        let content = serde_json::to_string_pretty(&Value::Object(object)).map_err(|e| {
            RulesError::InvalidFormat {
                reason: format!("JSON serialization failed: {}", e),
            }
        })?;
        fs::write(path, content).map_err(|e| RulesError::Io {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Iterates categories in declared order.
    pub fn iter(&self) -> impl Iterator<Item = &CategoryRule> {
        self.categories.iter()
    }

    /// Category names in declared order.
    pub fn category_names(&self) -> Vec<&str> {
        self.categories.iter().map(|c| c.name.as_str()).collect()
    }

    /// Whether `name` is a known category.
    pub fn contains(&self, name: &str) -> bool {
        self.categories.iter().any(|c| c.name == name)
    }

    fn ensure_fallback(&mut self) {
        if !self.contains(FALLBACK_CATEGORY) {
            self.categories.push(CategoryRule {
                name: FALLBACK_CATEGORY.to_string(),
                patterns: Vec::new(),
            });
        }
    }
}

impl Default for RuleStore {
    /// The built-in rule set, written out on first load so users have a
    /// document to edit.
    fn default() -> Self {
        Self::from_pairs([
            ("01_installers", vec![".exe", ".msi", ".dmg", ".pkg", ".deb", ".rpm", "setup", "installer"]),
            ("02_archives", vec![".zip", ".rar", ".7z", ".tar", ".gz", ".bz2", ".xz"]),
            ("03_disk_images", vec![".iso", ".img", ".vmdk", ".vhd", ".vhdx"]),
            ("04_documents", vec![".doc", ".docx", ".odt", ".rtf", "resume", "contract"]),
            ("05_spreadsheets", vec![".xls", ".xlsx", ".csv", ".ods", "report"]),
            ("06_presentations", vec![".ppt", ".pptx", ".key", ".odp", "slides"]),
            ("07_pdf", vec![".pdf"]),
            ("08_text", vec![".txt", ".md", ".log", ".xml", ".json", ".yaml", ".yml", ".ini", ".cfg", ".toml"]),
            ("09_ebooks", vec![".epub", ".mobi", ".azw3", ".djvu", ".cbz"]),
            ("10_images", vec![".jpg", ".jpeg", ".png", ".gif", ".bmp", ".webp", ".tiff", ".heic", "screenshot", "photo"]),
            ("11_design", vec![".psd", ".ai", ".svg", ".eps", ".sketch", ".fig"]),
            ("12_fonts", vec![".ttf", ".otf", ".woff", ".woff2", ".ttc"]),
            ("13_audio", vec![".mp3", ".wav", ".flac", ".m4a", ".aac", ".ogg", "recording"]),
            ("14_video", vec![".mp4", ".mkv", ".avi", ".mov", ".wmv", ".webm", "movie"]),
            ("15_code", vec![".py", ".js", ".java", ".c", ".cpp", ".h", ".cs", ".go", ".rs", ".rb", ".ts"]),
            ("16_web", vec![".html", ".htm", ".css"]),
            ("17_databases", vec![".sql", ".db", ".sqlite"]),
            ("18_backups", vec![".bak", ".old", ".tmp", ".sav", "backup"]),
            (FALLBACK_CATEGORY, vec![]),
        ])
    }
}
