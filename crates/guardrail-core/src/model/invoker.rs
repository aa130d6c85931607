//! Calling an external language model.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use super::provider::{strategy_for, ChatRequest};
use super::registry::ModelRegistry;
use super::settings::{EffectiveModel, ModelSettings, ProviderSettings, DEFAULT_TIMEOUT_SECS};

/// Why a model call produced no text.
#[derive(Debug, Error)]
pub enum InvokeError {
    /// No API key inline and none in the provider's environment variable.
    #[error("no API key configured for provider {0}")]
    MissingCredentials(String),

    /// The provider is not configured or has no known wire format.
    #[error("unsupported model provider: {0}")]
    UnsupportedProvider(String),

    /// Transport failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with a non-success status.
    #[error("provider returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// The response did not contain generated text.
    #[error("provider response contained no text")]
    EmptyResponse,
}

/// Sends one prompt to a model and returns its raw text reply.
#[async_trait]
pub trait ModelInvoker: Send + Sync {
    async fn invoke(&self, prompt: &str, system_instruction: &str) -> Result<String, InvokeError>;

    /// Upper bound for one call.
    fn timeout(&self) -> Duration {
        Duration::from_secs(DEFAULT_TIMEOUT_SECS)
    }

    /// Name for logging.
    fn name(&self) -> &'static str;
}

/// Invokes the registry's current model over HTTP.
#[derive(Debug, Clone)]
pub struct HttpModelInvoker {
    client: reqwest::Client,
    registry: Arc<ModelRegistry>,
}

impl HttpModelInvoker {
    pub fn new(registry: Arc<ModelRegistry>) -> Self {
        Self {
            client: reqwest::Client::new(),
            registry,
        }
    }

    /// Uses an existing HTTP client.
    pub fn with_client(client: reqwest::Client, registry: Arc<ModelRegistry>) -> Self {
        Self { client, registry }
    }

    pub fn registry(&self) -> &Arc<ModelRegistry> {
        &self.registry
    }
}

/// Inline key first, then the provider's environment variable.
pub fn resolve_api_key(current: &ModelSettings, provider: &ProviderSettings) -> Option<String> {
    current
        .api_key
        .clone()
        .filter(|key| !key.is_empty())
        .or_else(|| {
            provider
                .api_key_env
                .as_deref()
                .and_then(|var| std::env::var(var).ok())
                .filter(|key| !key.is_empty())
        })
}

#[async_trait]
impl ModelInvoker for HttpModelInvoker {
    async fn invoke(&self, prompt: &str, system_instruction: &str) -> Result<String, InvokeError> {
        let (current, provider) = self.registry.resolve_current();
        let provider =
            provider.ok_or_else(|| InvokeError::UnsupportedProvider(current.provider.clone()))?;
        let effective = EffectiveModel::resolve(&current, &provider)
            .ok_or_else(|| InvokeError::UnsupportedProvider(current.provider.clone()))?;
        let api_key = resolve_api_key(&current, &provider)
            .ok_or_else(|| InvokeError::MissingCredentials(current.provider.clone()))?;

        let strategy = strategy_for(effective.style);
        let body = strategy.body(&ChatRequest {
            model: &effective.model,
            system_instruction,
            prompt,
            temperature: effective.temperature,
            max_tokens: effective.max_tokens,
        });

        debug!(provider = %effective.provider, model = %effective.model, "Invoking model");

        let mut request = self
            .client
            .post(strategy.endpoint(&effective.base_url))
            .timeout(effective.timeout)
            .json(&body);
        for (name, value) in strategy.headers(&api_key) {
            request = request.header(name, value);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(InvokeError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let json: Value = response.json().await?;
        strategy
            .extract_text(&json)
            .ok_or(InvokeError::EmptyResponse)
    }

    fn timeout(&self) -> Duration {
        self.registry
            .effective()
            .map(|effective| effective.timeout)
            .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
