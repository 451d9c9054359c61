use std::collections::HashSet;
use std::str::FromStr;

use crate::{Error, Result};

/// How a free-text query is turned into graph match terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermStrategy {
    /// Strip question marks, split on whitespace, drop tokens shorter than
    /// `min_chars` characters (default)
    Tokens { min_chars: usize },
    /// The trimmed query is the only term
    WholeQuery,
}

impl TermStrategy {
    pub fn from_name(name: &str, min_chars: usize) -> Result<Self> {
        match name.to_lowercase().as_str() {
            "tokens" | "keywords" => Ok(Self::Tokens { min_chars }),
            "whole_query" | "whole" | "query" => Ok(Self::WholeQuery),
            other => Err(Error::Config(format!("unknown term strategy: {}", other))),
        }
    }
}

impl Default for TermStrategy {
    fn default() -> Self {
        Self::Tokens { min_chars: 2 }
    }
}

/// How a match term is compared against an entity name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchPolicy {
    /// Name contains the term (default)
    #[default]
    Substring,
    Exact,
    Prefix,
    /// Substring, ignoring case
    CaseInsensitive,
}

impl MatchPolicy {
    pub fn matches(&self, name: &str, term: &str) -> bool {
        match self {
            MatchPolicy::Substring => name.contains(term),
            MatchPolicy::Exact => name == term,
            MatchPolicy::Prefix => name.starts_with(term),
            MatchPolicy::CaseInsensitive => name.to_lowercase().contains(&term.to_lowercase()),
        }
    }

    /// Cypher boolean expression comparing `{var}.name` to `$term`.
    pub fn cypher_condition(&self, var: &str) -> String {
        match self {
            MatchPolicy::Substring => format!("{var}.name CONTAINS $term"),
            MatchPolicy::Exact => format!("{var}.name = $term"),
            MatchPolicy::Prefix => format!("{var}.name STARTS WITH $term"),
            MatchPolicy::CaseInsensitive => {
                format!("toLower({var}.name) CONTAINS toLower($term)")
            }
        }
    }
}

impl FromStr for MatchPolicy {
    type Err = Error;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "substring" | "contains" => Ok(Self::Substring),
            "exact" => Ok(Self::Exact),
            "prefix" | "starts_with" => Ok(Self::Prefix),
            "case_insensitive" | "ci" => Ok(Self::CaseInsensitive),
            other => Err(Error::Config(format!("unknown match policy: {}", other))),
        }
    }
}

/// Turns a query into ordered, deduplicated graph match terms.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordExtractor {
    strategy: TermStrategy,
}

impl KeywordExtractor {
    pub fn new(strategy: TermStrategy) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> TermStrategy {
        self.strategy
    }

    pub fn terms(&self, query: &str) -> Vec<String> {
        let candidates: Vec<String> = match self.strategy {
            TermStrategy::Tokens { min_chars } => query
                .replace(['?', '？'], "")
                .split_whitespace()
                .filter(|token| token.chars().count() >= min_chars)
                .map(str::to_string)
                .collect(),
            TermStrategy::WholeQuery => {
                let trimmed = query.trim();
                if trimmed.is_empty() {
                    Vec::new()
                } else {
                    vec![trimmed.to_string()]
                }
            }
        };

        let mut seen = HashSet::new();
        candidates
            .into_iter()
            .filter(|term| seen.insert(term.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_strip_question_marks_and_short_words() {
        let extractor = KeywordExtractor::default();
        assert_eq!(
            extractor.terms("RTX 2080 Ti 的 VRAM 是多少？"),
            vec!["RTX", "2080", "Ti", "VRAM", "是多少"]
        );
    }

    #[test]
    fn tokens_are_deduplicated_in_first_seen_order() {
        let extractor = KeywordExtractor::default();
        assert_eq!(
            extractor.terms("NVIDIA GPU NVIDIA? GPU"),
            vec!["NVIDIA", "GPU"]
        );
    }

    #[test]
    fn query_without_long_tokens_has_no_terms() {
        let extractor = KeywordExtractor::default();
        assert!(extractor.terms("a b ? c").is_empty());
        assert!(extractor.terms("").is_empty());
    }

    #[test]
    fn min_chars_counts_characters_not_bytes() {
        let extractor = KeywordExtractor::new(TermStrategy::Tokens { min_chars: 2 });
        assert_eq!(extractor.terms("顯 顯卡"), vec!["顯卡"]);
    }

    #[test]
    fn whole_query_keeps_the_trimmed_query() {
        let extractor = KeywordExtractor::new(TermStrategy::WholeQuery);
        assert_eq!(extractor.terms("  RTX 2080 Ti  "), vec!["RTX 2080 Ti"]);
        assert!(extractor.terms("   ").is_empty());
    }

    #[test]
    fn match_policies() {
        assert!(MatchPolicy::Substring.matches("RTX 2080 Ti", "2080"));
        assert!(!MatchPolicy::Substring.matches("RTX 2080 Ti", "rtx"));
        assert!(MatchPolicy::Exact.matches("NVIDIA", "NVIDIA"));
        assert!(!MatchPolicy::Exact.matches("NVIDIA Corp", "NVIDIA"));
        assert!(MatchPolicy::Prefix.matches("RTX 2080 Ti", "RTX"));
        assert!(!MatchPolicy::Prefix.matches("RTX 2080 Ti", "Ti"));
        assert!(MatchPolicy::CaseInsensitive.matches("RTX 2080 Ti", "rtx"));
    }

    #[test]
    fn cypher_conditions_use_term_parameter() {
        assert_eq!(MatchPolicy::Substring.cypher_condition("h"), "h.name CONTAINS $term");
        assert_eq!(MatchPolicy::Prefix.cypher_condition("t"), "t.name STARTS WITH $term");
        assert_eq!(
            MatchPolicy::CaseInsensitive.cypher_condition("h"),
            "toLower(h.name) CONTAINS toLower($term)"
        );
    }

    #[test]
    fn parses_names() {
        assert_eq!("exact".parse::<MatchPolicy>().unwrap(), MatchPolicy::Exact);
        assert_eq!("Prefix".parse::<MatchPolicy>().unwrap(), MatchPolicy::Prefix);
        assert!("fuzzy".parse::<MatchPolicy>().is_err());
        assert_eq!(
            TermStrategy::from_name("whole_query", 2).unwrap(),
            TermStrategy::WholeQuery
        );
        assert_eq!(
            TermStrategy::from_name("tokens", 3).unwrap(),
            TermStrategy::Tokens { min_chars: 3 }
        );
        assert!(TermStrategy::from_name("ngrams", 2).is_err());
    }
}
