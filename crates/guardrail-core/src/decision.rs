//! Merging triggered rules into a single verdict.
//!
//! ## Priority
//!
//! 1. `block` wins outright; the first blocking rule supplies the answer and
//!    evaluation stops.
//! 2. `rewrite` applies when nothing blocks; the last rewriting rule supplies
//!    the answer.
//! 3. `pass` never changes the outcome.
//!
//! The verdict's categories always list every triggered rule, whichever
//! action won.

use tracing::info;

use crate::policy::{Rule, RuleAction};
use crate::verdict::{Suggestion, Verdict};

/// A rule that fired during one inspection call.
#[derive(Debug, Clone, Copy)]
pub struct Violation<'a> {
    /// Name of the rule, reported as the category.
    pub rule_name: &'a str,
    /// The rule that fired.
    pub rule: &'a Rule,
}

impl<'a> Violation<'a> {
    pub fn new(rule_name: &'a str, rule: &'a Rule) -> Self {
        Self { rule_name, rule }
    }
}

/// Combines violations into a verdict.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecisionMerger;

impl DecisionMerger {
    pub fn new() -> Self {
        Self
    }

    /// The neutral verdict.
    pub fn pass_verdict(&self) -> Verdict {
        Verdict::pass()
    }

    /// Verdict for a fault inside the guardrail.
    pub fn error_verdict(&self, message: &str) -> Verdict {
        Verdict::error(message)
    }

    /// Merges violations, in detection order, into one verdict.
    pub fn merge(&self, violations: &[Violation<'_>]) -> Verdict {
        let mut final_action = Suggestion::Pass;
        let mut final_answer = "";

        for violation in violations {
            match violation.rule.action() {
                RuleAction::Block => {
                    final_action = Suggestion::Block;
                    final_answer = violation.rule.answer();
                    break;
                }
                RuleAction::Rewrite => {
                    final_action = Suggestion::Rewrite;
                    final_answer = violation.rule.answer();
                }
                RuleAction::Pass => {}
            }
        }

        let categories: Vec<String> = violations
            .iter()
            .map(|v| v.rule_name.to_string())
            .collect();

        info!(
            suggestion = final_action.as_str(),
            categories = ?categories,
            answer = final_answer,
            "Verdict merged"
        );

        Verdict::new(final_action, categories, final_answer)
    }
}
