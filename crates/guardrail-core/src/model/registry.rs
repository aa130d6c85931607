//! Runtime model selection.
//!
//! Holds the parsed provider table plus the currently selected model. The
//! selection can be changed at runtime and is reset to the configured default
//! on reload. A reload that fails keeps the previous configuration.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{error, info};

use super::settings::{EffectiveModel, ModelConfig, ModelSettings, ProviderSettings};
use crate::error::{ConfigError, Result};

#[derive(Debug, Clone, Default)]
struct RegistryState {
    config: ModelConfig,
    current: ModelSettings,
}

/// Shared model configuration.
#[derive(Debug)]
pub struct ModelRegistry {
    path: Option<PathBuf>,
    state: RwLock<Arc<RegistryState>>,
}

impl ModelRegistry {
    /// Creates a registry from an already parsed configuration. Reload is a no-op.
    pub fn from_config(config: ModelConfig) -> Self {
        let current = config.default_model.clone();
        Self {
            path: None,
            state: RwLock::new(Arc::new(RegistryState { config, current })),
        }
    }

    /// Loads `model_config.yaml` from `path`.
    ///
    /// A load failure is logged and leaves an empty configuration, so every
    /// model call fails and the judge fails open.
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let config = match read_config(&path) {
            Ok(config) => {
                info!(path = %path.display(), providers = config.providers.len(), "Model configuration loaded");
                config
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "Failed to load model configuration");
                ModelConfig::default()
            }
        };

        let registry = Self::from_config(config);
        Self {
            path: Some(path),
            ..registry
        }
    }

    /// The currently selected model.
    pub fn current(&self) -> ModelSettings {
        self.state.read().current.clone()
    }

    /// Selects a different model until the next reload.
    pub fn set_current(&self, settings: ModelSettings) {
        info!(provider = %settings.provider, model = ?settings.model, "Current model changed");
        let mut state = self.state.write();
        let config = state.config.clone();
        *state = Arc::new(RegistryState {
            config,
            current: settings,
        });
    }

    /// Settings of a named provider.
    pub fn provider(&self, name: &str) -> Option<ProviderSettings> {
        self.state.read().config.providers.get(name).cloned()
    }

    /// Resolves the current model and its provider together.
    ///
    /// Both halves come from the same snapshot.
    pub fn resolve_current(&self) -> (ModelSettings, Option<ProviderSettings>) {
        let state = Arc::clone(&self.state.read());
        let provider = state.config.providers.get(&state.current.provider).cloned();
        (state.current.clone(), provider)
    }

    /// Effective parameters of the current model, if its provider resolves.
    pub fn effective(&self) -> Option<EffectiveModel> {
        let (current, provider) = self.resolve_current();
        provider.and_then(|p| EffectiveModel::resolve(&current, &p))
    }

    /// Re-reads the configuration file and resets the current model to its default.
    pub fn reload(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        match read_config(path) {
            Ok(config) => {
                let current = config.default_model.clone();
                *self.state.write() = Arc::new(RegistryState { config, current });
                info!(path = %path.display(), "Model configuration reloaded");
                Ok(())
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "Model configuration reload failed, keeping previous");
                Err(e)
            }
        }
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::from_config(ModelConfig::default())
    }
}

fn read_config(path: &Path) -> Result<ModelConfig> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    ModelConfig::from_yaml_str(&contents)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = "providers:\n  openai:\n    base_url: https://api.openai.com/v1\n    api_key_env: OPENAI_API_KEY\ndefault:\n  provider: openai\n  model: gpt-4o-mini\n";

    fn config_file(contents: &str) -> tempfile::NamedTempFile {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), contents).unwrap();
        file
    }

    #[test]
    fn loads_default_as_current() {
        let file = config_file(CONFIG);
        let registry = ModelRegistry::from_file(file.path());
        assert_eq!(registry.current().provider, "openai");
        assert_eq!(registry.current().model.as_deref(), Some("gpt-4o-mini"));
        assert!(registry.provider("openai").is_some());
        assert!(registry.provider("anthropic").is_none());
    }

    #[test]
    fn missing_file_gives_empty_config() {
        let registry = ModelRegistry::from_file("/does/not/exist/model_config.yaml");
        assert!(registry.provider("openai").is_none());
        assert!(registry.effective().is_none());
    }

    #[test]
    fn set_current_changes_selection() {
        let registry = ModelRegistry::from_file(config_file(CONFIG).path());
        registry.set_current(ModelSettings {
            provider: "openai".to_string(),
            model: Some("gpt-4o".to_string()),
            ..Default::default()
        });
        assert_eq!(registry.current().model.as_deref(), Some("gpt-4o"));
        assert_eq!(registry.effective().unwrap().model, "gpt-4o");
    }

    #[test]
    fn reload_resets_current_to_default() {
        let file = config_file(CONFIG);
        let registry = ModelRegistry::from_file(file.path());
        registry.set_current(ModelSettings {
            model: Some("other".to_string()),
            ..Default::default()
        });

        registry.reload().unwrap();
        assert_eq!(registry.current().model.as_deref(), Some("gpt-4o-mini"));
    }

    #[test]
    fn failed_reload_keeps_previous() {
        let file = config_file(CONFIG);
        let registry = ModelRegistry::from_file(file.path());

        std::fs::write(file.path(), "providers: [oops").unwrap();
        assert!(registry.reload().is_err());

        assert!(registry.provider("openai").is_some());
        assert_eq!(registry.current().model.as_deref(), Some("gpt-4o-mini"));
    }

    #[test]
    fn in_memory_reload_is_noop() {
        let registry = ModelRegistry::default();
        assert!(registry.reload().is_ok());
        assert_eq!(registry.current(), ModelSettings::default());
    }
}
