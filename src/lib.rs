//! aisort - rule-based and AI-assisted directory organization
//!
//! This library classifies files and folders into category subfolders using a
//! layered strategy chain (extension match, keyword match, remote AI,
//! fallback bucket), records every move in a durable SQLite history and can
//! reverse an organization run.

pub mod ai;
pub mod classify;
pub mod cli;
pub mod config;
pub mod exclude;
pub mod history;
pub mod naming;
pub mod organizer;
pub mod output;
pub mod restorer;
pub mod rules;

pub use ai::AiClient;
pub use classify::{ClassifierChain, ClassifyOutcome, ScanItem, Strategy};
pub use config::{AppPaths, ConfigError, RunConfig};
pub use exclude::ExclusionFilter;
pub use history::{HistoryAction, HistoryDb, ItemKind, MoveRecord};
pub use organizer::{OrganizeError, OrganizeSummary, Organizer};
pub use restorer::{RestoreSummary, Restorer};
pub use rules::{FALLBACK_CATEGORY, RuleStore};

pub use cli::{Action, Cli, RunReport, run_cli};
