//! Run configuration and application file paths.
//!
//! Configuration is a small TOML document supplied by the settings
//! collaborator. It is loaded fresh before every run and immutable while a
//! run is in flight; the engine never reads ambient global state.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Sentinel value for `archive_name` meaning "no archive root": category
/// folders are created directly under the source directory.
pub const NO_ARCHIVE_SENTINEL: &str = "NONE";

/// Errors that can occur while loading or saving configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// An explicitly requested configuration file does not exist.
    NotFound(PathBuf),
    /// The configuration file is not valid TOML for `RunConfig`.
    Invalid(String),
    /// IO failure while reading or writing configuration.
    Io(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(path) => {
                write!(f, "Configuration file not found: {}", path.display())
            }
            Self::Invalid(msg) => write!(f, "Invalid configuration: {}", msg),
            Self::Io(msg) => write!(f, "IO error accessing configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Locations of the application's own files. These feed the exclusion filter
/// so the tool never organizes its own configuration or output.
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// TOML configuration file.
    pub config_file: PathBuf,
    /// JSON rules document.
    pub rules_file: PathBuf,
    /// SQLite history database.
    pub db_file: PathBuf,
    /// Diagnostic log file, reserved for external collaborators.
    pub log_file: PathBuf,
    /// The running executable, when resolvable.
    pub current_exe: Option<PathBuf>,
}

impl AppPaths {
    /// Resolves the standard per-user locations under
    /// `~/.config/aisort/`, creating the directory when missing.
    pub fn resolve() -> Result<Self, ConfigError> {
        let home = std::env::var("HOME")
            .map_err(|_| ConfigError::Io("HOME is not set".to_string()))?;
        let app_dir = PathBuf::from(home).join(".config").join("aisort");
        fs::create_dir_all(&app_dir).map_err(|e| ConfigError::Io(e.to_string()))?;
        Ok(Self::in_dir(&app_dir))
    }

    /// Places all application files inside `dir`. Used by tests and by
    /// callers that keep their state next to the data they organize.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            config_file: dir.join("config.toml"),
            rules_file: dir.join("rules.json"),
            db_file: dir.join("history.db"),
            log_file: dir.join("aisort.log"),
            current_exe: std::env::current_exe().ok(),
        }
    }
}

/// Settings for one organize or restore run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// API key for the remote classifier; blank disables the AI strategy.
    #[serde(default)]
    pub api_key: String,
    /// Base URL of the OpenAI-compatible endpoint.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Model identifier sent with each classification request.
    #[serde(default = "default_model")]
    pub model: String,
    /// Name of the archive root folder, or [`NO_ARCHIVE_SENTINEL`].
    #[serde(default = "default_archive_name")]
    pub archive_name: String,
    /// Simulate moves without touching the filesystem.
    #[serde(default)]
    pub dry_run: bool,
    /// Number of history records to keep; zero or negative disables trimming.
    #[serde(default = "default_retention_count")]
    pub retention_count: i64,
}

fn default_base_url() -> String {
    "https://api.deepseek.com".to_string()
}

fn default_model() -> String {
    "deepseek-chat".to_string()
}

fn default_archive_name() -> String {
    "Archive".to_string()
}

fn default_retention_count() -> i64 {
    100
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_base_url(),
            model: default_model(),
            archive_name: default_archive_name(),
            dry_run: false,
            retention_count: default_retention_count(),
        }
    }
}

impl RunConfig {
    /// Loads configuration.
    ///
    /// An explicitly provided path must exist and parse. Otherwise the
    /// default location is used when present, and a default document is
    /// written there on first run so users have a file to edit.
    pub fn load(explicit: Option<&Path>, paths: &AppPaths) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load_from_file(path);
        }
        if paths.config_file.exists() {
            return Self::load_from_file(&paths.config_file);
        }
        let config = Self::default();
        // Best-effort seed; an unwritable config dir is not fatal.
        let _ = config.save(&paths.config_file);
        Ok(config)
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        toml::from_str(&content).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Writes the configuration back to `path`, the surface used by external
    /// settings collaborators. Failures are reported, never panicked on.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        fs::write(path, content).map_err(|e| ConfigError::Io(e.to_string()))
    }

    /// The configured archive root name, or `None` when the sentinel (or an
    /// empty value) requests top-level category folders.
    pub fn archive_name(&self) -> Option<&str> {
        let name = self.archive_name.trim();
        if name.is_empty() || name == NO_ARCHIVE_SENTINEL {
            None
        } else {
            Some(name)
        }
    }
}
