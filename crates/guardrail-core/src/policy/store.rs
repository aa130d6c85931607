//! Shared, reloadable access to the policy table.
//!
//! Readers take a snapshot (`Arc<PolicyTable>`) and never observe a table
//! being rebuilt. `reload` parses a complete new table first and swaps the
//! pointer only on success; a failed reload keeps the previous table.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{error, info};

use super::rule::{Direction, Rule};
use super::source::PolicySource;
use super::table::{PolicyTable, RuleSet};
use crate::error::Result;

/// Resolves tenant rules from the current policy snapshot.
pub struct PolicyStore {
    source: Box<dyn PolicySource>,
    table: RwLock<Arc<PolicyTable>>,
}

impl std::fmt::Debug for PolicyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicyStore")
            .field("source", &self.source.describe())
            .field("tenants", &self.table.read().len())
            .finish()
    }
}

impl PolicyStore {
    /// Loads the initial table from `source`.
    ///
    /// A load failure is logged and leaves the store with an empty table.
    pub fn new(source: impl PolicySource + 'static) -> Self {
        let table = match source.load() {
            Ok(table) => {
                info!(source = %source.describe(), tenants = table.len(), "Policy loaded");
                table
            }
            Err(e) => {
                error!(source = %source.describe(), error = %e, "Failed to load policy, starting empty");
                PolicyTable::new()
            }
        };

        Self {
            source: Box::new(source),
            table: RwLock::new(Arc::new(table)),
        }
    }

    /// Returns the current table.
    pub fn snapshot(&self) -> Arc<PolicyTable> {
        Arc::clone(&self.table.read())
    }

    /// Returns a copy of the rules for `tenant` and `direction`; empty if none resolve.
    pub fn resolve(&self, tenant: &str, direction: Direction) -> RuleSet {
        self.snapshot()
            .rules(tenant, direction)
            .cloned()
            .unwrap_or_default()
    }

    /// Returns a copy of one rule.
    pub fn rule(&self, tenant: &str, direction: Direction, name: &str) -> Option<Rule> {
        self.snapshot().rule(tenant, direction, name).cloned()
    }

    /// Returns true only for a configured, enabled rule.
    pub fn is_enabled(&self, tenant: &str, direction: Direction, name: &str) -> bool {
        self.snapshot().is_enabled(tenant, direction, name)
    }

    /// Re-reads the source and swaps in the new table.
    ///
    /// On error the previous table stays active and the error is returned.
    pub fn reload(&self) -> Result<()> {
        match self.source.load() {
            Ok(table) => {
                let tenants = table.len();
                *self.table.write() = Arc::new(table);
                info!(source = %self.source.describe(), tenants, "Policy reloaded");
                Ok(())
            }
            Err(e) => {
                error!(source = %self.source.describe(), error = %e, "Policy reload failed, keeping previous policy");
                Err(e)
            }
        }
    }
}
