use crate::backend::GenerativeBackend;
use crate::caller::ModelCaller;
use std::sync::Arc;
use threadsift_core::{LlmConfig, ModelCallResult};
use tracing::{error, info, warn};

pub const ALL_OVERLOADED_MESSAGE: &str =
    "All AI models are currently overloaded or out of quota. Please try again in a few minutes.";

/// Walks the primary model and then each fallback until one succeeds.
#[derive(Clone)]
pub struct FallbackOrchestrator {
    caller: ModelCaller,
    primary_model: String,
    fallback_models: Vec<String>,
    primary_retries: u32,
    fallback_retries: u32,
}

impl FallbackOrchestrator {
    pub fn new(backend: Arc<dyn GenerativeBackend>, config: LlmConfig) -> Self {
        Self {
            primary_model: config.primary_model.clone(),
            fallback_models: config.fallback_models.clone(),
            primary_retries: config.primary_retries,
            fallback_retries: config.fallback_retries,
            caller: ModelCaller::new(backend, config),
        }
    }

    pub fn caller(&self) -> &ModelCaller {
        &self.caller
    }

    /// Primary model, then each fallback in order.
    pub async fn analyze(&self, prompt: &str) -> ModelCallResult {
        let mut failures = Vec::new();
        self.run_chain(prompt, &mut failures).await
    }

    /// Try `model` first; if it fails, run the whole primary and fallback
    /// chain. The named model is not skipped if it also appears in the chain.
    pub async fn analyze_with_model(&self, prompt: &str, model: &str) -> ModelCallResult {
        let result = self.caller.call(model, prompt, self.primary_retries).await;
        if result.success {
            return result;
        }

        warn!(
            "Requested model {} failed ({}), falling back to the default chain",
            model,
            result.error.as_deref().unwrap_or("unknown error")
        );
        let mut failures = vec![result];
        self.run_chain(prompt, &mut failures).await
    }

    async fn run_chain(&self, prompt: &str, failures: &mut Vec<ModelCallResult>) -> ModelCallResult {
        let chain = std::iter::once((&self.primary_model, self.primary_retries)).chain(
            self.fallback_models
                .iter()
                .map(|model| (model, self.fallback_retries)),
        );

        for (model, retries) in chain {
            let result = self.caller.call(model, prompt, retries).await;
            if result.success {
                if !failures.is_empty() {
                    info!("Fallback model {} succeeded after {} failures", model, failures.len());
                }
                return result;
            }
            warn!(
                "Model {} failed: {}",
                model,
                result.error.as_deref().unwrap_or("unknown error")
            );
            failures.push(result);
        }

        aggregate_failure(failures)
    }
}

/// One failure summarising a chain in which every model failed.
pub fn aggregate_failure(failures: &[ModelCallResult]) -> ModelCallResult {
    let Some(last) = failures.last() else {
        return ModelCallResult::failure("none", "No models configured", None);
    };
    let model = last.model.clone().unwrap_or_default();

    if failures.iter().all(ModelCallResult::is_capacity_failure) {
        error!("All {} models overloaded or out of quota", failures.len());
        return ModelCallResult::failure(model, ALL_OVERLOADED_MESSAGE, last.code);
    }

    let last_error = last.error.as_deref().unwrap_or("unknown error");
    error!("All {} models failed, last error: {}", failures.len(), last_error);
    ModelCallResult::failure(
        model,
        format!("All AI models failed. Last error: {}", last_error),
        last.code,
    )
}
