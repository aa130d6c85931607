//! External model access for the judge.
//!
//! [`ModelRegistry`] holds provider settings and the current model selection;
//! [`HttpModelInvoker`] turns a prompt into one provider call using the
//! [`ProviderStrategy`] for that provider's wire format.

mod invoker;
mod provider;
mod registry;
mod settings;

pub use invoker::{resolve_api_key, HttpModelInvoker, InvokeError, ModelInvoker};
pub use provider::{
    strategy_for, AnthropicStrategy, ChatRequest, OpenAiStrategy, ProviderStrategy,
    ANTHROPIC_VERSION,
};
pub use registry::ModelRegistry;
pub use settings::{
    ApiStyle, EffectiveModel, ModelConfig, ModelSettings, ProviderSettings, DEFAULT_MAX_TOKENS,
    DEFAULT_TEMPERATURE, DEFAULT_TIMEOUT_SECS, FALLBACK_MODEL, REDACTED_KEY,
};
