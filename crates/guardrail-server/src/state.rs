//! Application state for the API server.

use std::sync::Arc;

use guardrail_core::{Guardrail, GuardrailConfig};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// The inspection pipeline and its reloadable configuration.
    pub guardrail: Arc<Guardrail>,
}

impl AppState {
    pub fn new(guardrail: Guardrail) -> Self {
        Self {
            guardrail: Arc::new(guardrail),
        }
    }

    /// Loads configuration from `config`.
    pub fn from_config(config: &GuardrailConfig) -> Self {
        Self::new(Guardrail::from_config(config))
    }
}
