//! File locations and behaviour settings for a [`Guardrail`](crate::Guardrail).

use std::path::{Path, PathBuf};

use crate::judge::JudgeConfig;

/// Policy file name inside the config directory.
pub const POLICY_FILE: &str = "policy.yaml";
/// Model configuration file name inside the config directory.
pub const MODEL_CONFIG_FILE: &str = "model_config.yaml";
/// Config directory used when none is given.
pub const DEFAULT_CONFIG_DIR: &str = "config";

#[derive(Debug, Clone)]
pub struct GuardrailConfig {
    pub policy_path: PathBuf,
    pub model_config_path: PathBuf,
    pub judge: JudgeConfig,
}

impl Default for GuardrailConfig {
    fn default() -> Self {
        Self::from_dir(DEFAULT_CONFIG_DIR)
    }
}

impl GuardrailConfig {
    /// Uses `policy.yaml` and `model_config.yaml` inside `dir`.
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            policy_path: dir.join(POLICY_FILE),
            model_config_path: dir.join(MODEL_CONFIG_FILE),
            judge: JudgeConfig::default(),
        }
    }

    /// Enables a single jittered retry of failed model calls.
    pub fn with_retry(mut self, retry: bool) -> Self {
        self.judge.retry_on_failure = retry;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_dir_joins_file_names() {
        let config = GuardrailConfig::from_dir("/etc/guardrail");
        assert_eq!(config.policy_path, Path::new("/etc/guardrail/policy.yaml"));
        assert_eq!(
            config.model_config_path,
            Path::new("/etc/guardrail/model_config.yaml")
        );
        assert!(!config.judge.retry_on_failure);
    }

    #[test]
    fn default_uses_local_config_dir() {
        let config = GuardrailConfig::default();
        assert_eq!(config.policy_path, Path::new("config/policy.yaml"));
        assert!(config.with_retry(true).judge.retry_on_failure);
    }
}
