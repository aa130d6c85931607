//! Policy rules and their on-disk representation.

use std::fmt;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, Result};

/// Which side of the conversation is being inspected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// User-to-model text.
    Input,
    /// Model-to-user text.
    Output,
}

impl Direction {
    /// Returns the configuration key for this direction.
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Input => "input",
            Direction::Output => "output",
        }
    }

    /// Parses a configuration key.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "input" => Some(Direction::Input),
            "output" => Some(Direction::Output),
            _ => None,
        }
    }

    /// Rules evaluated for this direction, in evaluation order.
    pub fn rule_names(&self) -> &'static [&'static str] {
        match self {
            Direction::Input => &["prompt_injection", "sensitive_info", "compliance"],
            Direction::Output => &["output_compliance", "hallucination"],
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Action a rule requests when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleAction {
    /// Record the violation without intervening.
    Pass,
    /// Refuse the text.
    #[default]
    Block,
    /// Replace the text with the rule's answer.
    Rewrite,
}

impl RuleAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleAction::Pass => "pass",
            RuleAction::Block => "block",
            RuleAction::Rewrite => "rewrite",
        }
    }
}

/// How a rule decides whether it applies to a text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchCriteria {
    /// Case-sensitive literal containment.
    Keywords(Vec<String>),
    /// Case-insensitive regular expressions.
    Patterns(Vec<String>),
}

impl Default for MatchCriteria {
    fn default() -> Self {
        MatchCriteria::Keywords(Vec::new())
    }
}

/// A rule exactly as written in `policy.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patterns: Option<Vec<String>>,
    #[serde(default)]
    pub action: RuleAction,
    #[serde(default)]
    pub answer: String,
}

/// A loaded, ready-to-match policy rule.
///
/// Patterns are compiled once at load time. A pattern that does not compile is
/// left out of `compiled` and can never match.
#[derive(Debug, Clone)]
pub struct Rule {
    enabled: bool,
    criteria: MatchCriteria,
    action: RuleAction,
    answer: String,
    compiled: Vec<Regex>,
}

impl Rule {
    /// Creates an enabled keyword rule.
    pub fn keywords<I, S>(keywords: I, action: RuleAction, answer: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            enabled: true,
            criteria: MatchCriteria::Keywords(keywords.into_iter().map(Into::into).collect()),
            action,
            answer: answer.into(),
            compiled: Vec::new(),
        }
    }

    /// Creates an enabled pattern rule, skipping patterns that fail to compile.
    pub fn patterns<I, S>(patterns: I, action: RuleAction, answer: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let patterns: Vec<String> = patterns.into_iter().map(Into::into).collect();
        let compiled = compile_patterns(&patterns, "<inline>");
        Self {
            enabled: true,
            criteria: MatchCriteria::Patterns(patterns),
            action,
            answer: answer.into(),
            compiled,
        }
    }

    /// Builds a rule from its configuration. `location` names the rule in warnings.
    pub fn from_config(config: RuleConfig, location: &str) -> Result<Self> {
        let criteria = match (config.keywords, config.patterns) {
            (Some(_), Some(_)) => {
                return Err(ConfigError::Invalid(format!(
                    "rule {location} sets both keywords and patterns"
                )))
            }
            (_, Some(patterns)) => MatchCriteria::Patterns(patterns),
            (Some(keywords), None) => MatchCriteria::Keywords(keywords),
            (None, None) => MatchCriteria::default(),
        };

        let compiled = match &criteria {
            MatchCriteria::Patterns(patterns) => compile_patterns(patterns, location),
            MatchCriteria::Keywords(keywords) => {
                if keywords.iter().any(String::is_empty) {
                    warn!(rule = location, "Ignoring empty keyword, it never matches");
                }
                Vec::new()
            }
        };

        Ok(Self {
            enabled: config.enabled,
            criteria,
            action: config.action,
            answer: config.answer,
            compiled,
        })
    }

    /// Sets whether this rule is enabled.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn criteria(&self) -> &MatchCriteria {
        &self.criteria
    }

    pub fn action(&self) -> RuleAction {
        self.action
    }

    pub fn answer(&self) -> &str {
        &self.answer
    }

    /// Compiled patterns, in configuration order.
    pub(crate) fn compiled(&self) -> &[Regex] {
        &self.compiled
    }
}

impl PartialEq for Rule {
    fn eq(&self, other: &Self) -> bool {
        self.enabled == other.enabled
            && self.criteria == other.criteria
            && self.action == other.action
            && self.answer == other.answer
    }
}

fn compile_patterns(patterns: &[String], location: &str) -> Vec<Regex> {
    patterns
        .iter()
        .filter_map(|pattern| {
            match RegexBuilder::new(pattern).case_insensitive(true).build() {
                Ok(regex) => Some(regex),
                Err(e) => {
                    warn!(rule = location, pattern = %pattern, error = %e, "Skipping invalid rule pattern");
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_rule_lists() {
        assert_eq!(
            Direction::Input.rule_names(),
            ["prompt_injection", "sensitive_info", "compliance"]
        );
        assert_eq!(
            Direction::Output.rule_names(),
            ["output_compliance", "hallucination"]
        );
    }

    #[test]
    fn direction_keys_round_trip() {
        assert_eq!(Direction::from_key("input"), Some(Direction::Input));
        assert_eq!(Direction::from_key("output"), Some(Direction::Output));
        assert_eq!(Direction::from_key("sideways"), None);
        assert_eq!(Direction::Output.to_string(), "output");
    }

    #[test]
    fn config_defaults() {
        let config: RuleConfig = serde_yml::from_str("keywords: [a]").unwrap();
        assert!(!config.enabled);
        assert_eq!(config.action, RuleAction::Block);
        assert_eq!(config.answer, "");
    }

    #[test]
    fn from_config_prefers_declared_mode() {
        let config = RuleConfig {
            enabled: true,
            patterns: Some(vec![r"\d+".to_string()]),
            action: RuleAction::Rewrite,
            answer: "masked".to_string(),
            ..Default::default()
        };
        let rule = Rule::from_config(config, "default.input.sensitive_info").unwrap();
        assert!(rule.is_enabled());
        assert_eq!(rule.action(), RuleAction::Rewrite);
        assert_eq!(rule.answer(), "masked");
        assert!(matches!(rule.criteria(), MatchCriteria::Patterns(p) if p.len() == 1));
        assert_eq!(rule.compiled().len(), 1);
    }

    #[test]
    fn from_config_rejects_mixed_modes() {
        let config = RuleConfig {
            keywords: Some(vec!["a".to_string()]),
            patterns: Some(vec!["b".to_string()]),
            ..Default::default()
        };
        let err = Rule::from_config(config, "t.input.r").unwrap_err();
        assert!(err.to_string().contains("both keywords and patterns"));
    }

    #[test]
    fn invalid_patterns_are_dropped() {
        let rule = Rule::patterns(["(unclosed", r"ok\d"], RuleAction::Block, "");
        assert_eq!(rule.compiled().len(), 1);
        assert_eq!(rule.compiled()[0].as_str(), r"ok\d");
    }

    #[test]
    fn equality_ignores_compiled_cache() {
        let a = Rule::patterns([r"\d"], RuleAction::Block, "x");
        let b = Rule::patterns([r"\d"], RuleAction::Block, "x");
        assert_eq!(a, b);
        assert_ne!(a, b.clone().with_enabled(false));
    }
}
