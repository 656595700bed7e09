//! Substring exclusion lists.
//!
//! A candidate is excluded when any pattern occurs in it. Matching is
//! case-sensitive and patterns carry no precedence: the first hit wins.

use serde::{Deserialize, Serialize};

/// Ordered set of substring patterns.
///
/// Deserializes from either a newline-delimited string or an array of
/// strings. Blank lines and surrounding whitespace are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "PatternSource", into = "PatternSource")]
pub struct ExclusionList {
    patterns: Vec<String>,
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum PatternSource {
    Lines(String),
    List(Vec<String>),
}

impl From<PatternSource> for ExclusionList {
    fn from(source: PatternSource) -> Self {
        match source {
            PatternSource::Lines(text) => Self::parse(&text),
            PatternSource::List(list) => Self::from_iter(list),
        }
    }
}

impl From<ExclusionList> for PatternSource {
    fn from(list: ExclusionList) -> Self {
        PatternSource::List(list.patterns)
    }
}

impl<S: AsRef<str>> FromIterator<S> for ExclusionList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut list = Self::default();
        for pattern in iter {
            list.push(pattern.as_ref());
        }
        list
    }
}

impl ExclusionList {
    /// Parse a newline-delimited pattern list.
    pub fn parse(text: &str) -> Self {
        text.lines().collect()
    }

    /// Add one pattern (trimmed; empty and duplicate patterns are ignored).
    pub fn push(&mut self, pattern: &str) {
        let pattern = pattern.trim();
        if !pattern.is_empty() && !self.patterns.iter().any(|p| p == pattern) {
            self.patterns.push(pattern.to_string());
        }
    }

    /// Union with a fixed default list, keeping user patterns first.
    pub fn with_defaults(&self, defaults: &[&str]) -> Self {
        let mut list = self.clone();
        for pattern in defaults {
            list.push(pattern);
        }
        list
    }

    /// True iff any pattern is a substring of `candidate`.
    pub fn is_excluded(&self, candidate: &str) -> bool {
        self.matching(candidate).is_some()
    }

    /// True iff any pattern occurs in any of the candidates.
    pub fn is_any_excluded(&self, candidates: &[&str]) -> bool {
        candidates.iter().any(|c| self.is_excluded(c))
    }

    /// First pattern found in `candidate`.
    pub fn matching(&self, candidate: &str) -> Option<&str> {
        self.patterns
            .iter()
            .find(|p| candidate.contains(p.as_str()))
            .map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(String::as_str)
    }
}
