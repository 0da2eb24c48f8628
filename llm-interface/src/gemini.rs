//! Google Gemini `generateContent` backend.

use crate::backend::{GenerationParams, GenerativeBackend};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use threadsift_core::{AppConfig, CoreError, LlmConfig, LlmError};
use tracing::{debug, error};

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const PROVIDER: &str = "gemini";

#[derive(Debug)]
pub struct GeminiBackend {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiBackend {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self, CoreError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: GEMINI_API_BASE.to_string(),
        })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, CoreError> {
        let api_key = AppConfig::require(&config.api_key, "GEMINI_API_KEY")?;
        Self::new(api_key, Duration::from_secs(config.request_timeout_secs))
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: &'a GenerationParams,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

/// Text of the first candidate with all of its parts joined.
fn first_candidate_text(model: &str, response: GeminiResponse) -> Result<String, LlmError> {
    let parts = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| content.parts)
        .unwrap_or_default();

    if parts.is_empty() {
        return Err(LlmError::InvalidResponseFormat {
            model: model.to_string(),
            details: "unexpected response format: no candidates or parts".to_string(),
        });
    }

    Ok(parts.into_iter().map(|part| part.text).collect())
}

fn status_error(model: &str, status: StatusCode, body: String) -> LlmError {
    let model = model.to_string();
    match status.as_u16() {
        503 => LlmError::ServiceUnavailable { model },
        429 => LlmError::RateLimitExceeded { model },
        404 => LlmError::ModelNotAvailable { model },
        401 => LlmError::InvalidApiKey {
            provider: PROVIDER.to_string(),
        },
        status_code => LlmError::RequestFailed {
            model,
            status_code,
            body,
        },
    }
}

#[async_trait]
impl GenerativeBackend for GeminiBackend {
    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<String, LlmError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, model);
        let request = GeminiRequest {
            contents: vec![Content {
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: params,
        };

        debug!(
            "Calling {} (max_output_tokens={}, top_k={})",
            model, params.max_output_tokens, params.top_k
        );
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::RequestTimeout {
                        model: model.to_string(),
                    }
                } else {
                    LlmError::Transport {
                        model: model.to_string(),
                        message: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("{} returned {}", model, status);
            return Err(status_error(model, status, body));
        }

        let parsed: GeminiResponse =
            response
                .json()
                .await
                .map_err(|e| LlmError::InvalidResponseFormat {
                    model: model.to_string(),
                    details: e.to_string(),
                })?;

        first_candidate_text(model, parsed)
    }
}
