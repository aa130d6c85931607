//! Provider-specific request and response shaping.
//!
//! Each [`ApiStyle`] maps to one [`ProviderStrategy`]. Adding a provider with
//! a new wire format means adding a strategy here; nothing above the invoker
//! changes.

use serde_json::{json, Value};

use super::settings::ApiStyle;

/// Anthropic API version header value.
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// One chat completion request, independent of provider.
#[derive(Debug, Clone, Copy)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub system_instruction: &'a str,
    pub prompt: &'a str,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Wire format of one provider family.
pub trait ProviderStrategy: Send + Sync {
    /// Full request URL for `base_url`.
    fn endpoint(&self, base_url: &str) -> String;

    /// Authentication and versioning headers.
    fn headers(&self, api_key: &str) -> Vec<(&'static str, String)>;

    /// JSON request body.
    fn body(&self, request: &ChatRequest<'_>) -> Value;

    /// Pulls the generated text out of a response body.
    fn extract_text(&self, response: &Value) -> Option<String>;
}

/// OpenAI chat completions, also spoken by Zhipu and Qwen.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenAiStrategy;

impl ProviderStrategy for OpenAiStrategy {
    fn endpoint(&self, base_url: &str) -> String {
        format!("{base_url}/chat/completions")
    }

    fn headers(&self, api_key: &str) -> Vec<(&'static str, String)> {
        vec![("authorization", format!("Bearer {api_key}"))]
    }

    fn body(&self, request: &ChatRequest<'_>) -> Value {
        let mut messages = Vec::with_capacity(2);
        if !request.system_instruction.is_empty() {
            messages.push(json!({"role": "system", "content": request.system_instruction}));
        }
        messages.push(json!({"role": "user", "content": request.prompt}));

        json!({
            "model": request.model,
            "messages": messages,
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
        })
    }

    fn extract_text(&self, response: &Value) -> Option<String> {
        response
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .map(str::to_string)
    }
}

/// Anthropic messages API.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnthropicStrategy;

impl ProviderStrategy for AnthropicStrategy {
    fn endpoint(&self, base_url: &str) -> String {
        format!("{base_url}/messages")
    }

    fn headers(&self, api_key: &str) -> Vec<(&'static str, String)> {
        vec![
            ("x-api-key", api_key.to_string()),
            ("anthropic-version", ANTHROPIC_VERSION.to_string()),
        ]
    }

    fn body(&self, request: &ChatRequest<'_>) -> Value {
        let mut body = json!({
            "model": request.model,
            "messages": [{"role": "user", "content": request.prompt}],
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
        });
        if !request.system_instruction.is_empty() {
            body["system"] = Value::String(request.system_instruction.to_string());
        }
        body
    }

    fn extract_text(&self, response: &Value) -> Option<String> {
        response
            .pointer("/content/0/text")
            .and_then(Value::as_str)
            .map(str::to_string)
    }
}

/// Returns the strategy for a wire format.
pub fn strategy_for(style: ApiStyle) -> &'static dyn ProviderStrategy {
    match style {
        ApiStyle::OpenAi => &OpenAiStrategy,
        ApiStyle::Anthropic => &AnthropicStrategy,
    }
}
