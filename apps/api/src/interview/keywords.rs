//! Keyword extraction: the bag of significant terms a job description mentions.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

/// Common English words and generic job-posting vocabulary that carry no topical signal.
pub const STOPWORDS: &[&str] = &[
    "the", "and", "that", "have", "for", "not", "with", "you", "this", "but", "his", "from",
    "they", "she", "will", "would", "there", "their", "what", "about", "which", "when", "make",
    "like", "time", "just", "know", "take", "person", "into", "year", "your", "good", "some",
    "could", "them", "see", "other", "than", "then", "now", "look", "only", "come", "its",
    "over", "think", "also", "back", "after", "use", "two", "how", "our", "work", "first",
    "well", "way", "even", "new", "want", "because", "any", "these", "give", "day", "most",
    "can", "are", "has", "was", "were", "had", "does", "did", "doing", "done", "should",
    "must", "may", "might", "shall", "experience", "role", "job", "candidate", "skill",
    "ability", "team", "project", "develop", "create", "build", "implement", "design",
    "manage", "lead", "communicate", "collaborate", "solve", "problem", "solution",
    "requirement", "responsibility", "qualification",
];

static STOPWORD_SET: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| STOPWORDS.iter().copied().collect());

/// Maximal runs of three or more alphabetic characters, accented letters included.
static TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\p{Alphabetic}{3,}").expect("token regex is valid"));

/// Lowercase terms of a job description, stopwords removed, duplicates collapsed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordSet(HashSet<String>);

impl KeywordSet {
    pub fn contains(&self, term: &str) -> bool {
        self.0.contains(term)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Terms in lexical order, for logging and stable output.
    pub fn sorted(&self) -> Vec<&str> {
        let mut terms: Vec<&str> = self.iter().collect();
        terms.sort_unstable();
        terms
    }
}

impl<S: Into<String>> FromIterator<S> for KeywordSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Extracts the keyword set of `text`. Never fails; empty input yields an empty set.
pub fn extract_keywords(text: &str) -> KeywordSet {
    let lower = text.to_lowercase();
    TOKEN
        .find_iter(&lower)
        .map(|m| m.as_str())
        .filter(|token| !STOPWORD_SET.contains(token))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_keywords_lowercases_and_dedups() {
        let keywords = extract_keywords("Rust RUST rust Kubernetes");
        assert_eq!(keywords.sorted(), vec!["kubernetes", "rust"]);
    }

    #[test]
    fn test_extract_keywords_drops_stopwords_and_short_tokens() {
        let keywords = extract_keywords("The team will build an API in Go with Python");
        assert_eq!(keywords.sorted(), vec!["api", "python"]);
    }

    #[test]
    fn test_extract_keywords_splits_on_non_letters() {
        let keywords = extract_keywords("node.js, ci/cd and postgres14db");
        assert_eq!(keywords.sorted(), vec!["node", "postgres"]);
    }

    #[test]
    fn test_extract_keywords_keeps_accented_words_whole() {
        let keywords = extract_keywords("Développeur RÉSUMÉ café");
        assert_eq!(keywords.sorted(), vec!["café", "développeur", "résumé"]);
        assert!(!keywords.contains("sum"));
        assert!(!keywords.contains("caf"));
    }

    #[test]
    fn test_extract_keywords_empty_input() {
        assert!(extract_keywords("").is_empty());
        assert!(extract_keywords("a an to 42 !!").is_empty());
    }

    #[test]
    fn test_generic_job_vocabulary_is_ignored() {
        let keywords = extract_keywords("Experience leading a team on the project is a requirement");
        assert_eq!(keywords.sorted(), vec!["leading"]);
    }

    #[test]
    fn test_keyword_set_from_iter() {
        let keywords: KeywordSet = ["docker", "python", "docker"].into_iter().collect();
        assert_eq!(keywords.len(), 2);
        assert!(keywords.contains("docker"));
        assert!(!keywords.contains("rust"));
    }
}
