use crate::backend::{GenerationParams, GenerativeBackend};
use crate::retry::{RetryPolicy, RetryStrategy};
use std::sync::Arc;
use threadsift_core::{LlmConfig, ModelCallResult};
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

/// Issues one generation request per attempt and applies the retry policy.
///
/// Never returns an error: every outcome, including exhaustion, is a
/// [`ModelCallResult`].
#[derive(Clone)]
pub struct ModelCaller {
    backend: Arc<dyn GenerativeBackend>,
    config: LlmConfig,
    policy: RetryPolicy,
}

impl ModelCaller {
    pub fn new(backend: Arc<dyn GenerativeBackend>, config: LlmConfig) -> Self {
        let policy = RetryPolicy::from_config(&config);
        Self {
            backend,
            config,
            policy,
        }
    }

    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    pub async fn call(&self, model: &str, prompt: &str, max_retries: u32) -> ModelCallResult {
        let params = GenerationParams::for_model(&self.config, model);
        let attempts = max_retries.max(1);

        for attempt in 1..=attempts {
            debug!("Calling {} (attempt {}/{})", model, attempt, attempts);

            let err = match self.backend.generate(model, prompt, &params).await {
                Ok(text) => {
                    info!("{} answered on attempt {} ({} chars)", model, attempt, text.len());
                    return ModelCallResult::success(model, text);
                }
                Err(err) => err,
            };

            let delay = match self.policy.strategy_for(&err, attempt) {
                RetryStrategy::NoRetry => {
                    warn!("{} failed without retry: {}", model, err);
                    return ModelCallResult::failure(model, err.to_string(), err.status_code());
                }
                _ if attempt == attempts => {
                    error!("{} failed after {} attempts: {}", model, attempts, err);
                    return ModelCallResult::failure(model, err.to_string(), err.status_code());
                }
                RetryStrategy::Backoff(delay) | RetryStrategy::RetryWithDelay(delay) => delay,
            };

            warn!(
                "{} attempt {} failed ({}), retrying in {:?}",
                model, attempt, err, delay
            );
            sleep(delay).await;
        }

        // `attempts` is at least one, so the loop always returns.
        ModelCallResult::failure(model, "no attempts made", None)
    }
}
