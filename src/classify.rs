//! Layered classification chain.
//!
//! Each item runs through an ordered list of strategies; the first strategy
//! with an opinion wins. The chain always terminates because the fallback
//! strategy unconditionally answers with the reserved category.

use crate::ai::AiClient;
use crate::rules::{FALLBACK_CATEGORY, RuleStore};
use std::path::PathBuf;

/// A filesystem entry under classification. Built per enumeration pass and
/// never persisted.
#[derive(Debug, Clone)]
pub struct ScanItem {
    /// Bare entry name.
    pub name: String,
    /// Whether the entry is a directory.
    pub is_dir: bool,
    /// Absolute path of the entry.
    pub path: PathBuf,
}

/// Outcome of a single strategy.
///
/// `RemoteError` is distinct from `NoOpinion` so the swallowed-failure path
/// of the remote strategy is directly assertable; the chain treats both as
/// "try the next strategy".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassifyOutcome {
    /// The strategy picked a category.
    Match(String),
    /// The strategy has nothing to say about this item.
    NoOpinion,
    /// The remote call failed; never propagated as an error.
    RemoteError(String),
}

/// One classification strategy. The set is closed; ordering within the chain
/// encodes priority.
pub enum Strategy {
    /// Matches a file's lowercase extension against extension patterns.
    /// Never applies to directories.
    Extension,
    /// Matches any pattern as a case-insensitive substring of the item name.
    /// Applies to files and directories.
    Keyword,
    /// Asks the configured remote model; failures collapse to no opinion.
    RemoteAi(AiClient),
    /// Unconditionally answers with the reserved category.
    Fallback,
}

impl Strategy {
    /// Attempts to classify `item` against the current rule snapshot.
    pub fn classify(&self, item: &ScanItem, rules: &RuleStore) -> ClassifyOutcome {
        match self {
            Self::Extension => Self::by_extension(item, rules),
            Self::Keyword => Self::by_keyword(item, rules),
            Self::RemoteAi(client) => Self::by_remote(client, item, rules),
            Self::Fallback => ClassifyOutcome::Match(FALLBACK_CATEGORY.to_string()),
        }
    }

    fn by_extension(item: &ScanItem, rules: &RuleStore) -> ClassifyOutcome {
        if item.is_dir {
            return ClassifyOutcome::NoOpinion;
        }
        let ext = match item.name.rfind('.') {
            Some(idx) if idx > 0 => item.name[idx..].to_lowercase(),
            _ => return ClassifyOutcome::NoOpinion,
        };
        for rule in rules.iter() {
            if rule.patterns.iter().any(|p| p.to_lowercase() == ext) {
                return ClassifyOutcome::Match(rule.name.clone());
            }
        }
        ClassifyOutcome::NoOpinion
    }

    fn by_keyword(item: &ScanItem, rules: &RuleStore) -> ClassifyOutcome {
        let name = item.name.to_lowercase();
        for rule in rules.iter() {
            for pattern in &rule.patterns {
                if !pattern.is_empty() && name.contains(&pattern.to_lowercase()) {
                    return ClassifyOutcome::Match(rule.name.clone());
                }
            }
        }
        ClassifyOutcome::NoOpinion
    }

    fn by_remote(client: &AiClient, item: &ScanItem, rules: &RuleStore) -> ClassifyOutcome {
        match client.suggest_category(&item.name, item.is_dir, &rules.category_names()) {
            Ok(Some(category)) => ClassifyOutcome::Match(category),
            Ok(None) => ClassifyOutcome::NoOpinion,
            Err(e) => ClassifyOutcome::RemoteError(e.to_string()),
        }
    }
}

/// Ordered strategy chain ending in the fallback strategy.
pub struct ClassifierChain {
    strategies: Vec<Strategy>,
}

impl ClassifierChain {
    /// Builds the standard chain: extension, keyword, optional remote AI,
    /// fallback.
    pub fn new(ai_client: Option<AiClient>) -> Self {
        let mut strategies = vec![Strategy::Extension, Strategy::Keyword];
        if let Some(client) = ai_client {
            strategies.push(Strategy::RemoteAi(client));
        }
        strategies.push(Strategy::Fallback);
        Self { strategies }
    }

    /// Inserts an extra strategy just before the terminal fallback, keeping
    /// the chain's termination guarantee intact.
    pub fn insert_before_fallback(&mut self, strategy: Strategy) {
        let at = self.strategies.len().saturating_sub(1);
        self.strategies.insert(at, strategy);
    }

    /// Classifies one item. Remote errors are swallowed and the chain moves
    /// on, so every item receives a category.
    pub fn classify(&self, item: &ScanItem, rules: &RuleStore) -> String {
        for strategy in &self.strategies {
            match strategy.classify(item, rules) {
                ClassifyOutcome::Match(category) => return category,
                ClassifyOutcome::NoOpinion | ClassifyOutcome::RemoteError(_) => continue,
            }
        }
        // Unreachable while the fallback strategy terminates the chain.
        FALLBACK_CATEGORY.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str, is_dir: bool) -> ScanItem {
        ScanItem {
            name: name.to_string(),
            is_dir,
            path: PathBuf::from(format!("/tmp/{}", name)),
        }
    }

    fn rules() -> RuleStore {
        RuleStore::from_pairs([
            ("10_images", vec![".png", ".jpg", "photo"]),
            ("08_text", vec![".txt", "notes"]),
            ("14_video", vec![".mp4", "movie"]),
        ])
    }

    #[test]
    fn test_extension_match_is_case_insensitive() {
        let rules = rules();
        assert_eq!(
            Strategy::Extension.classify(&item("Holiday.PNG", false), &rules),
            ClassifyOutcome::Match("10_images".to_string())
        );
    }

    #[test]
    fn test_extension_never_applies_to_directories() {
        let rules = rules();
        assert_eq!(
            Strategy::Extension.classify(&item("backup.png", true), &rules),
            ClassifyOutcome::NoOpinion
        );
    }

    #[test]
    fn test_extension_outranks_keyword() {
        // "photo" is an image keyword, but the .txt extension wins because
        // the extension strategy runs first.
        let chain = ClassifierChain::new(None);
        let rules = rules();
        assert_eq!(chain.classify(&item("photo.txt", false), &rules), "08_text");
    }

    #[test]
    fn test_keyword_matches_directories() {
        let rules = rules();
        assert_eq!(
            Strategy::Keyword.classify(&item("My Photos", true), &rules),
            ClassifyOutcome::Match("10_images".to_string())
        );
    }

    #[test]
    fn test_keyword_tie_break_follows_declared_order() {
        // "photo" (10_images) and "notes" (08_text) both occur in the name;
        // 10_images is declared first.
        let rules = rules();
        assert_eq!(
            Strategy::Keyword.classify(&item("photo_notes", true), &rules),
            ClassifyOutcome::Match("10_images".to_string())
        );
    }

    #[test]
    fn test_no_match_without_ai_returns_fallback() {
        let chain = ClassifierChain::new(None);
        let rules = rules();
        assert_eq!(
            chain.classify(&item("mystery.xyz", false), &rules),
            FALLBACK_CATEGORY
        );
        assert_eq!(chain.classify(&item("mystery", true), &rules), FALLBACK_CATEGORY);
    }

    #[test]
    fn test_no_opinion_is_observable_per_strategy() {
        let rules = rules();
        assert_eq!(
            Strategy::Extension.classify(&item("mystery.xyz", false), &rules),
            ClassifyOutcome::NoOpinion
        );
        assert_eq!(
            Strategy::Keyword.classify(&item("mystery.xyz", false), &rules),
            ClassifyOutcome::NoOpinion
        );
    }

    #[test]
    fn test_remote_failure_falls_through_to_fallback() {
        // Unreachable endpoint: the remote strategy errors, the chain
        // swallows it and the fallback answers.
        let client =
            crate::ai::AiClient::new("sk-test", "http://127.0.0.1:9", "model-x").expect("client");
        let chain = ClassifierChain::new(Some(client));
        let rules = rules();
        assert_eq!(
            chain.classify(&item("mystery.xyz", false), &rules),
            FALLBACK_CATEGORY
        );
    }

    #[test]
    fn test_insert_before_fallback_keeps_fallback_last() {
        let mut chain = ClassifierChain::new(None);
        chain.insert_before_fallback(Strategy::Keyword);
        assert!(matches!(chain.strategies.last(), Some(Strategy::Fallback)));
    }
}
