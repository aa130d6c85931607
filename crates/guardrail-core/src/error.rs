//! Configuration error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading policy or model configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration text is not valid YAML of the expected shape.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_yml::Error),

    /// The configuration parsed but is semantically invalid.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
