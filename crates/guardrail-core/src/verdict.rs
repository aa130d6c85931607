//! Inspection verdicts.

use serde::{Deserialize, Serialize};

/// Category reported with every error verdict.
pub const SYSTEM_ERROR_CATEGORY: &str = "system_error";

/// What the caller should do with the inspected text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Suggestion {
    /// Let the text through unchanged.
    #[default]
    Pass,
    /// Refuse the text and reply with the substitute answer.
    Block,
    /// Replace the text with the substitute answer.
    Rewrite,
    /// The guardrail itself failed.
    Error,
}

impl Suggestion {
    /// Returns the wire name of this suggestion.
    pub fn as_str(&self) -> &'static str {
        match self {
            Suggestion::Pass => "pass",
            Suggestion::Block => "block",
            Suggestion::Rewrite => "rewrite",
            Suggestion::Error => "error",
        }
    }

    /// Returns true for anything other than [`Suggestion::Pass`].
    pub fn is_intervention(&self) -> bool {
        !matches!(self, Suggestion::Pass)
    }
}

/// Outcome of one inspection call.
///
/// Verdicts are immutable once built; `categories` keeps detection order and
/// never holds the same tag twice.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Verdict {
    suggestion: Suggestion,
    categories: Vec<String>,
    answer: String,
}

impl Verdict {
    /// Builds a verdict, dropping repeated categories while keeping first-seen order.
    pub fn new(
        suggestion: Suggestion,
        categories: impl IntoIterator<Item = String>,
        answer: impl Into<String>,
    ) -> Self {
        let mut unique: Vec<String> = Vec::new();
        for category in categories {
            if !unique.contains(&category) {
                unique.push(category);
            }
        }

        Self {
            suggestion,
            categories: unique,
            answer: answer.into(),
        }
    }

    /// The neutral verdict: `{pass, [], ""}`.
    pub fn pass() -> Self {
        Self::default()
    }

    /// Verdict for a fault inside the guardrail.
    pub fn error(message: impl AsRef<str>) -> Self {
        Self {
            suggestion: Suggestion::Error,
            categories: vec![SYSTEM_ERROR_CATEGORY.to_string()],
            answer: format!("System error: {}", message.as_ref()),
        }
    }

    pub fn suggestion(&self) -> Suggestion {
        self.suggestion
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn answer(&self) -> &str {
        &self.answer
    }

    /// Returns true if the text may go through unchanged.
    pub fn is_pass(&self) -> bool {
        self.suggestion == Suggestion::Pass
    }

    /// Splits the verdict into its parts.
    pub fn into_parts(self) -> (Suggestion, Vec<String>, String) {
        (self.suggestion, self.categories, self.answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pass_verdict_is_neutral() {
        let verdict = Verdict::pass();
        assert_eq!(verdict.suggestion(), Suggestion::Pass);
        assert!(verdict.categories().is_empty());
        assert_eq!(verdict.answer(), "");
        assert!(verdict.is_pass());
    }

    #[test]
    fn error_verdict_carries_message() {
        let verdict = Verdict::error("policy unavailable");
        assert_eq!(verdict.suggestion(), Suggestion::Error);
        assert_eq!(verdict.categories(), ["system_error"]);
        assert_eq!(verdict.answer(), "System error: policy unavailable");
    }

    #[test]
    fn new_drops_duplicate_categories_in_order() {
        let verdict = Verdict::new(
            Suggestion::Block,
            ["b", "a", "b", "c", "a"].map(String::from),
            "no",
        );
        assert_eq!(verdict.categories(), ["b", "a", "c"]);
    }

    #[test]
    fn suggestion_wire_names() {
        assert_eq!(Suggestion::Pass.as_str(), "pass");
        assert_eq!(Suggestion::Rewrite.as_str(), "rewrite");
        assert_eq!(
            serde_json::to_string(&Suggestion::Block).unwrap(),
            "\"block\""
        );
        assert!(!Suggestion::Pass.is_intervention());
        assert!(Suggestion::Error.is_intervention());
    }

    #[test]
    fn verdict_serializes_flat() {
        let verdict = Verdict::new(Suggestion::Rewrite, vec!["compliance".to_string()], "safe");
        let json = serde_json::to_value(&verdict).unwrap();
        assert_eq!(json["suggestion"], "rewrite");
        assert_eq!(json["categories"][0], "compliance");
        assert_eq!(json["answer"], "safe");
    }
}
