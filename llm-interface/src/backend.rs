use async_trait::async_trait;
use serde::Serialize;
use threadsift_core::{LlmConfig, LlmError};

/// Sampling settings sent with every generation request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationParams {
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub max_output_tokens: u32,
}

impl GenerationParams {
    /// Tiered budget for `model`: advanced models get the larger token and
    /// top-K allowance.
    pub fn for_model(config: &LlmConfig, model: &str) -> Self {
        let tier = config.tier_for(model);
        Self {
            temperature: config.temperature,
            top_k: tier.top_k,
            top_p: config.top_p,
            max_output_tokens: tier.max_output_tokens,
        }
    }
}

/// One prompt in, the full generated text out.
///
/// Implementations map upstream failures onto [`LlmError`] so the retry
/// policy can act on the status code.
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<String, LlmError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_follow_model_tier() {
        let config = LlmConfig::default();

        let advanced = GenerationParams::for_model(&config, "gemini-2.5-pro");
        assert_eq!(advanced.max_output_tokens, 65_536);
        assert_eq!(advanced.top_k, 64);

        let standard = GenerationParams::for_model(&config, "gemini-2.0-flash");
        assert_eq!(standard.max_output_tokens, 8_192);
        assert_eq!(standard.top_k, 40);
        assert_eq!(standard.temperature, 0.7);
        assert_eq!(standard.top_p, 0.95);
    }

    #[test]
    fn test_params_serialize_camel_case() {
        let params = GenerationParams::for_model(&LlmConfig::default(), "gemini-2.0-flash");
        let json = serde_json::to_value(params).unwrap();
        assert_eq!(json["maxOutputTokens"], 8192);
        assert_eq!(json["topK"], 40);
    }
}
