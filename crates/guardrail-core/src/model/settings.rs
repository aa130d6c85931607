//! Model provider configuration (`model_config.yaml`).

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Model used when neither the current settings nor the provider name one.
pub const FALLBACK_MODEL: &str = "gpt-4o-mini";
/// Sampling temperature used when none is configured.
pub const DEFAULT_TEMPERATURE: f32 = 0.1;
/// Completion token limit used when none is configured.
pub const DEFAULT_MAX_TOKENS: u32 = 500;
/// Request timeout, in seconds, used when none is configured.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
/// Placeholder shown instead of an inline API key.
pub const REDACTED_KEY: &str = "***";

/// Request/response shape a provider speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiStyle {
    /// `POST {base_url}/chat/completions` with bearer auth.
    #[serde(rename = "openai")]
    OpenAi,
    /// `POST {base_url}/messages` with `x-api-key`.
    Anthropic,
}

impl ApiStyle {
    /// Style of the providers known by name.
    pub fn for_provider(name: &str) -> Option<Self> {
        match name {
            "openai" | "zhipu" | "qwen" => Some(ApiStyle::OpenAi),
            "anthropic" => Some(ApiStyle::Anthropic),
            _ => None,
        }
    }
}

/// Connection settings for one provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderSettings {
    pub base_url: String,
    /// Environment variable holding the API key.
    #[serde(default)]
    pub api_key_env: Option<String>,
    /// Overrides the style implied by the provider name.
    #[serde(default)]
    pub api_style: Option<ApiStyle>,
    #[serde(default)]
    pub default_model: Option<String>,
    #[serde(default)]
    pub default_temperature: Option<f32>,
    #[serde(default)]
    pub default_max_tokens: Option<u32>,
    /// Seconds.
    #[serde(default)]
    pub default_timeout: Option<u64>,
}

/// The model the judge currently talks to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSettings {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    /// Inline API key; takes precedence over the provider's `api_key_env`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    /// Seconds.
    #[serde(default)]
    pub timeout: Option<u64>,
}

fn default_provider() -> String {
    "openai".to_string()
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            api_key: None,
            temperature: None,
            max_tokens: None,
            timeout: None,
        }
    }
}

impl ModelSettings {
    /// Copy with the inline API key masked, for display.
    pub fn redacted(&self) -> Self {
        Self {
            api_key: self.api_key.as_ref().map(|_| REDACTED_KEY.to_string()),
            ..self.clone()
        }
    }
}

/// Parsed `model_config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default)]
    pub providers: HashMap<String, ProviderSettings>,
    /// Model selected at startup and after every reload.
    #[serde(default, rename = "default")]
    pub default_model: ModelSettings,
}

impl ModelConfig {
    /// Parses `model_config.yaml` text.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yml::from_str(yaml)?)
    }
}

/// Fully resolved parameters for one model call.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveModel {
    pub provider: String,
    pub style: ApiStyle,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl EffectiveModel {
    /// Layers `current` over `provider` defaults over built-in defaults.
    ///
    /// Returns `None` when the provider has no known API style.
    pub fn resolve(current: &ModelSettings, provider: &ProviderSettings) -> Option<Self> {
        let style = provider
            .api_style
            .or_else(|| ApiStyle::for_provider(&current.provider))?;

        Some(Self {
            provider: current.provider.clone(),
            style,
            base_url: provider.base_url.trim_end_matches('/').to_string(),
            model: current
                .model
                .clone()
                .or_else(|| provider.default_model.clone())
                .unwrap_or_else(|| FALLBACK_MODEL.to_string()),
            temperature: current
                .temperature
                .or(provider.default_temperature)
                .unwrap_or(DEFAULT_TEMPERATURE),
            max_tokens: current
                .max_tokens
                .or(provider.default_max_tokens)
                .unwrap_or(DEFAULT_MAX_TOKENS),
            timeout: Duration::from_secs(
                current
                    .timeout
                    .or(provider.default_timeout)
                    .unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
providers:
  openai:
    base_url: "https://api.openai.com/v1/"
    api_key_env: OPENAI_API_KEY
    default_model: gpt-4o-mini
  anthropic:
    base_url: "https://api.anthropic.com/v1"
    api_key_env: ANTHROPIC_API_KEY
    default_max_tokens: 800
  local:
    base_url: "http://localhost:11434/v1"
    api_style: openai
default:
  provider: openai
  model: gpt-4o
  temperature: 0.2
  timeout: 10
"#;

    #[test]
    fn parses_providers_and_default() {
        let config = ModelConfig::from_yaml_str(CONFIG).unwrap();
        assert_eq!(config.providers.len(), 3);
        assert_eq!(config.default_model.provider, "openai");
        assert_eq!(config.default_model.model.as_deref(), Some("gpt-4o"));
        assert_eq!(
            config.providers["openai"].api_key_env.as_deref(),
            Some("OPENAI_API_KEY")
        );
    }

    #[test]
    fn empty_config_defaults() {
        let config = ModelConfig::from_yaml_str("  ").unwrap();
        assert!(config.providers.is_empty());
        assert_eq!(config.default_model, ModelSettings::default());
    }

    #[test]
    fn current_settings_override_provider_defaults() {
        let config = ModelConfig::from_yaml_str(CONFIG).unwrap();
        let effective =
            EffectiveModel::resolve(&config.default_model, &config.providers["openai"]).unwrap();
        assert_eq!(effective.style, ApiStyle::OpenAi);
        assert_eq!(effective.base_url, "https://api.openai.com/v1");
        assert_eq!(effective.model, "gpt-4o");
        assert_eq!(effective.temperature, 0.2);
        assert_eq!(effective.max_tokens, DEFAULT_MAX_TOKENS);
        assert_eq!(effective.timeout, Duration::from_secs(10));
    }

    #[test]
    fn provider_defaults_fill_gaps() {
        let config = ModelConfig::from_yaml_str(CONFIG).unwrap();
        let current = ModelSettings {
            provider: "anthropic".to_string(),
            ..Default::default()
        };
        let effective = EffectiveModel::resolve(&current, &config.providers["anthropic"]).unwrap();
        assert_eq!(effective.style, ApiStyle::Anthropic);
        assert_eq!(effective.model, FALLBACK_MODEL);
        assert_eq!(effective.max_tokens, 800);
        assert_eq!(effective.temperature, DEFAULT_TEMPERATURE);
        assert_eq!(effective.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[test]
    fn explicit_style_allows_custom_provider() {
        let config = ModelConfig::from_yaml_str(CONFIG).unwrap();
        let current = ModelSettings {
            provider: "local".to_string(),
            ..Default::default()
        };
        let effective = EffectiveModel::resolve(&current, &config.providers["local"]).unwrap();
        assert_eq!(effective.style, ApiStyle::OpenAi);
    }

    #[test]
    fn unknown_provider_without_style_is_unresolved() {
        let current = ModelSettings {
            provider: "mystery".to_string(),
            ..Default::default()
        };
        assert!(EffectiveModel::resolve(&current, &ProviderSettings::default()).is_none());
    }

    #[test]
    fn redacted_masks_api_key() {
        let settings = ModelSettings {
            api_key: Some("sk-secret".to_string()),
            ..Default::default()
        };
        assert_eq!(settings.redacted().api_key.as_deref(), Some("***"));
        assert!(ModelSettings::default().redacted().api_key.is_none());
    }

    #[test]
    fn shipped_config_resolves_every_provider() {
        let config =
            ModelConfig::from_yaml_str(include_str!("../../../../config/model_config.yaml")).unwrap();
        for (name, provider) in &config.providers {
            let current = ModelSettings {
                provider: name.clone(),
                ..Default::default()
            };
            assert!(EffectiveModel::resolve(&current, provider).is_some(), "{name}");
        }
        assert_eq!(config.default_model.timeout, Some(DEFAULT_TIMEOUT_SECS));
    }
}
