//! The per-tenant policy table.

use std::collections::HashMap;

use tracing::warn;

use super::rule::{Direction, Rule, RuleConfig};
use crate::error::Result;

/// Tenant consulted when the requested tenant has no entry.
pub const DEFAULT_TENANT: &str = "default";

/// Rules for one direction, keyed by rule name.
pub type RuleSet = HashMap<String, Rule>;

/// `policy.yaml` as written: tenant -> direction -> rule name -> raw rule.
///
/// Rules stay untyped here so one malformed rule cannot reject the whole file.
pub type PolicyConfig = HashMap<String, HashMap<String, HashMap<String, serde_yml::Value>>>;

/// Rules of one tenant, split by direction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TenantPolicy {
    pub input: RuleSet,
    pub output: RuleSet,
}

impl TenantPolicy {
    /// Returns the rules for a direction.
    pub fn rules(&self, direction: Direction) -> &RuleSet {
        match direction {
            Direction::Input => &self.input,
            Direction::Output => &self.output,
        }
    }

    fn rules_mut(&mut self, direction: Direction) -> &mut RuleSet {
        match direction {
            Direction::Input => &mut self.input,
            Direction::Output => &mut self.output,
        }
    }

    /// Adds or replaces a rule.
    pub fn insert(&mut self, direction: Direction, name: impl Into<String>, rule: Rule) {
        self.rules_mut(direction).insert(name.into(), rule);
    }
}

fn parse_rule(raw: serde_yml::Value, location: &str) -> Result<Rule> {
    let config: RuleConfig = serde_yml::from_value(raw)?;
    Rule::from_config(config, location)
}

/// Immutable snapshot of every tenant's rules.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolicyTable {
    tenants: HashMap<String, TenantPolicy>,
}

impl PolicyTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a table from `policy.yaml` text.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::new());
        }
        let config: PolicyConfig = serde_yml::from_str(yaml)?;
        Ok(Self::from_config(config))
    }

    /// Builds a table from parsed configuration.
    ///
    /// Unknown direction keys and invalid rules are skipped with a warning;
    /// the remaining rules still load.
    pub fn from_config(config: PolicyConfig) -> Self {
        let mut table = Self::new();

        for (tenant, directions) in config {
            let mut policy = TenantPolicy::default();
            for (key, rules) in directions {
                let Some(direction) = Direction::from_key(&key) else {
                    warn!(tenant = %tenant, direction = %key, "Ignoring unknown policy direction");
                    continue;
                };
                for (name, raw) in rules {
                    let location = format!("{tenant}.{key}.{name}");
                    match parse_rule(raw, &location) {
                        Ok(rule) => policy.insert(direction, name, rule),
                        Err(e) => {
                            warn!(rule = %location, error = %e, "Skipping invalid policy rule");
                        }
                    }
                }
            }
            table.tenants.insert(tenant, policy);
        }

        table
    }

    /// Adds or replaces a tenant.
    pub fn with_tenant(mut self, tenant: impl Into<String>, policy: TenantPolicy) -> Self {
        self.tenants.insert(tenant.into(), policy);
        self
    }

    /// Returns the tenant's policy, falling back to [`DEFAULT_TENANT`].
    pub fn tenant(&self, tenant: &str) -> Option<&TenantPolicy> {
        self.tenants
            .get(tenant)
            .or_else(|| self.tenants.get(DEFAULT_TENANT))
    }

    /// Returns the rules applying to `tenant` in `direction`, if any tenant entry resolves.
    pub fn rules(&self, tenant: &str, direction: Direction) -> Option<&RuleSet> {
        self.tenant(tenant).map(|policy| policy.rules(direction))
    }

    /// Looks up a single rule.
    pub fn rule(&self, tenant: &str, direction: Direction, name: &str) -> Option<&Rule> {
        self.rules(tenant, direction).and_then(|rules| rules.get(name))
    }

    /// Returns true only for a configured rule whose `enabled` flag is set.
    pub fn is_enabled(&self, tenant: &str, direction: Direction, name: &str) -> bool {
        self.rule(tenant, direction, name)
            .map(Rule::is_enabled)
            .unwrap_or(false)
    }

    /// Number of tenants in the table.
    pub fn len(&self) -> usize {
        self.tenants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tenants.is_empty()
    }
}
