use std::time::Duration;
use threadsift_core::{LlmConfig, LlmError};

/// What to do after a failed model call.
#[derive(Debug, Clone, PartialEq)]
pub enum RetryStrategy {
    /// Overloaded model: exponential backoff.
    Backoff(Duration),
    /// Any other transient failure: fixed pause.
    RetryWithDelay(Duration),
    /// Out of quota or no such model. Retrying cannot help.
    NoRetry,
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub backoff_base_secs: u64,
    pub error_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&LlmConfig::default())
    }
}

impl RetryPolicy {
    pub fn from_config(config: &LlmConfig) -> Self {
        Self {
            backoff_base_secs: config.overload_backoff_base_secs,
            error_delay: Duration::from_secs(config.error_retry_delay_secs),
        }
    }

    /// Strategy after `attempt` (1-based) failed with `error`.
    pub fn strategy_for(&self, error: &LlmError, attempt: u32) -> RetryStrategy {
        match error.status_code() {
            Some(503) => RetryStrategy::Backoff(self.backoff_delay(attempt)),
            Some(429) | Some(404) => RetryStrategy::NoRetry,
            _ => RetryStrategy::RetryWithDelay(self.error_delay),
        }
    }

    /// `base^attempt` seconds.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        Duration::from_secs(self.backoff_base_secs.saturating_pow(attempt))
    }
}
