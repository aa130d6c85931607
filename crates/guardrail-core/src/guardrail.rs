//! The assembled guardrail service.

use std::sync::Arc;

use tracing::info;

use crate::config::GuardrailConfig;
use crate::error::Result;
use crate::inspector::Inspector;
use crate::judge::ModelJudge;
use crate::model::{HttpModelInvoker, ModelRegistry};
use crate::policy::{Direction, FilePolicySource, PolicyStore};
use crate::verdict::Verdict;

/// Policy store, model registry and judge, shared by every inspection.
#[derive(Debug, Clone)]
pub struct Guardrail {
    policy: Arc<PolicyStore>,
    models: Arc<ModelRegistry>,
    judge: Arc<ModelJudge>,
}

impl Guardrail {
    /// Builds a guardrail from files, judging with the registry's current model over HTTP.
    ///
    /// Missing or invalid files are logged and leave empty configuration.
    pub fn from_config(config: &GuardrailConfig) -> Self {
        let policy = Arc::new(PolicyStore::new(FilePolicySource::new(&config.policy_path)));
        let models = Arc::new(ModelRegistry::from_file(&config.model_config_path));
        let invoker = Arc::new(HttpModelInvoker::new(Arc::clone(&models)));
        let judge = Arc::new(ModelJudge::with_config(invoker, config.judge.clone()));

        info!(
            policy = %config.policy_path.display(),
            models = %config.model_config_path.display(),
            "Guardrail initialized"
        );

        Self::with_components(policy, models, judge)
    }

    /// Assembles a guardrail from existing parts.
    pub fn with_components(
        policy: Arc<PolicyStore>,
        models: Arc<ModelRegistry>,
        judge: Arc<ModelJudge>,
    ) -> Self {
        Self {
            policy,
            models,
            judge,
        }
    }

    pub fn inspector(&self, tenant: &str, direction: Direction) -> Inspector {
        Inspector::new(
            tenant,
            direction,
            Arc::clone(&self.policy),
            Arc::clone(&self.judge),
        )
    }

    pub async fn inspect(&self, tenant: &str, direction: Direction, text: &str) -> Verdict {
        self.inspector(tenant, direction).inspect(text).await
    }

    /// Inspects a user prompt.
    pub async fn inspect_input(&self, tenant: &str, text: &str) -> Verdict {
        self.inspect(tenant, Direction::Input, text).await
    }

    /// Inspects a model response.
    pub async fn inspect_output(&self, tenant: &str, text: &str) -> Verdict {
        self.inspect(tenant, Direction::Output, text).await
    }

    /// Re-reads the policy; the previous table stays active on failure.
    pub fn reload_policy(&self) -> Result<()> {
        self.policy.reload()
    }

    /// Re-reads the model configuration and resets the current model.
    pub fn reload_models(&self) -> Result<()> {
        self.models.reload()
    }

    pub fn policy(&self) -> &Arc<PolicyStore> {
        &self.policy
    }

    pub fn models(&self) -> &Arc<ModelRegistry> {
        &self.models
    }
}
