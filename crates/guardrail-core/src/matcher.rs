//! Rule matching against a text body.
//!
//! Keyword rules use case-sensitive containment; pattern rules run their
//! pre-compiled, case-insensitive regexes. Both stop at the first hit.

use crate::policy::{MatchCriteria, Rule};

/// Evaluates a single rule against text.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleMatcher;

impl RuleMatcher {
    pub fn new() -> Self {
        Self
    }

    /// Returns true if `rule` hits anywhere in `text`.
    pub fn matches(&self, text: &str, rule: &Rule) -> bool {
        self.find(text, rule).is_some()
    }

    /// Returns the keyword or pattern that hit first, if any.
    ///
    /// The enabled flag is not consulted here.
    pub fn find<'r>(&self, text: &str, rule: &'r Rule) -> Option<&'r str> {
        match rule.criteria() {
            MatchCriteria::Keywords(keywords) => keywords
                .iter()
                .find(|keyword| !keyword.is_empty() && text.contains(keyword.as_str()))
                .map(String::as_str),
            MatchCriteria::Patterns(_) => rule
                .compiled()
                .iter()
                .find(|regex| regex.is_match(text))
                .map(|regex| regex.as_str()),
        }
    }
}
