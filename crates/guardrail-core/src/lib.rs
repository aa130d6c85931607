//! Guardrail Core - content-safety decisions for LLM traffic.
//!
//! Every inspection follows the same pipeline:
//!
//! 1. Empty text passes immediately.
//! 2. The [`ModelJudge`] asks an external model for a verdict. A non-pass
//!    verdict is final; any failure to obtain one fails open.
//! 3. Otherwise the tenant's enabled rules are matched against the text and
//!    the [`DecisionMerger`] folds the violations into one [`Verdict`].
//!
//! # Example
//!
//! ```no_run
//! use guardrail_core::{Guardrail, GuardrailConfig};
//!
//! # async fn run() {
//! let guardrail = Guardrail::from_config(&GuardrailConfig::from_dir("config"));
//! let verdict = guardrail.inspect_input("default", "hello").await;
//! println!("{}", verdict.suggestion().as_str());
//! # }
//! ```

pub mod config;
pub mod decision;
pub mod error;
mod guardrail;
pub mod inspector;
pub mod judge;
pub mod matcher;
pub mod model;
pub mod policy;
pub mod verdict;

pub use config::GuardrailConfig;
pub use decision::{DecisionMerger, Violation};
pub use error::{ConfigError, Result};
pub use guardrail::Guardrail;
pub use inspector::Inspector;
pub use judge::{parse_verdict, JudgeConfig, JudgeError, ModelJudge};
pub use matcher::RuleMatcher;
pub use model::{HttpModelInvoker, InvokeError, ModelInvoker, ModelRegistry, ModelSettings};
pub use policy::{Direction, PolicyStore, PolicyTable, Rule, RuleAction, DEFAULT_TENANT};
pub use verdict::{Suggestion, Verdict};
