//! Where policy tables come from.

use std::path::{Path, PathBuf};

use super::table::PolicyTable;
use crate::error::{ConfigError, Result};

/// A re-readable origin of the policy table.
pub trait PolicySource: Send + Sync {
    /// Reads and parses the whole table.
    fn load(&self) -> Result<PolicyTable>;

    /// Short description for logs.
    fn describe(&self) -> String;
}

/// Reads `policy.yaml` from disk on every load.
#[derive(Debug, Clone)]
pub struct FilePolicySource {
    path: PathBuf,
}

impl FilePolicySource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PolicySource for FilePolicySource {
    fn load(&self) -> Result<PolicyTable> {
        let contents = std::fs::read_to_string(&self.path).map_err(|source| ConfigError::Read {
            path: self.path.clone(),
            source,
        })?;
        PolicyTable::from_yaml_str(&contents)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// A fixed table, mostly for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct StaticPolicySource {
    table: PolicyTable,
}

impl StaticPolicySource {
    pub fn new(table: PolicyTable) -> Self {
        Self { table }
    }
}

impl PolicySource for StaticPolicySource {
    fn load(&self) -> Result<PolicyTable> {
        Ok(self.table.clone())
    }

    fn describe(&self) -> String {
        "static".to_string()
    }
}
