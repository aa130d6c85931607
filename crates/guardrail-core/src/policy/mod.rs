//! Per-tenant policy rules.
//!
//! A policy table maps tenant -> direction -> rule name -> [`Rule`]. Tenants
//! without an entry use the `default` tenant. The table is loaded wholesale
//! from a [`PolicySource`] and shared through [`PolicyStore`].

mod rule;
mod source;
mod store;
mod table;

pub use rule::{Direction, MatchCriteria, Rule, RuleAction, RuleConfig};
pub use source::{FilePolicySource, PolicySource, StaticPolicySource};
pub use store::PolicyStore;
pub use table::{PolicyConfig, PolicyTable, RuleSet, TenantPolicy, DEFAULT_TENANT};
