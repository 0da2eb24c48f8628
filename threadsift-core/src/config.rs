use crate::error::{ConfigError, CoreError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

pub const CONFIG_PATH_ENV: &str = "THREADSIFT_CONFIG";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub reddit: RedditConfig,
    pub youtube: YouTubeConfig,
    pub llm: LlmConfig,
    pub batch: BatchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RedditConfig {
    #[serde(skip_serializing)]
    pub client_id: Option<String>,
    #[serde(skip_serializing)]
    pub client_secret: Option<String>,
    pub user_agent: String,
    pub max_comments: usize,
    /// Comments requested from the API per post.
    pub fetch_limit: u32,
    pub fetch_depth: u32,
}

impl Default for RedditConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            user_agent: "threadsift/0.1 (comment digest)".to_string(),
            max_comments: 50,
            fetch_limit: 500,
            fetch_depth: 8,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct YouTubeConfig {
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub max_comments: usize,
    pub max_comment_pages: u32,
    pub max_replies_per_thread: usize,
    pub daily_quota: u64,
}

impl Default for YouTubeConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            max_comments: 150,
            max_comment_pages: 10,
            max_replies_per_thread: 5,
            daily_quota: 10_000,
        }
    }
}

/// Generation budget for one model tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierParams {
    pub max_output_tokens: u32,
    pub top_k: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub primary_model: String,
    pub fallback_models: Vec<String>,
    /// Substrings that mark a model name as advanced.
    pub advanced_markers: Vec<String>,
    pub advanced_tier: TierParams,
    pub standard_tier: TierParams,
    pub temperature: f32,
    pub top_p: f32,
    pub primary_retries: u32,
    pub fallback_retries: u32,
    pub overload_backoff_base_secs: u64,
    pub error_retry_delay_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            primary_model: "gemini-2.5-flash".to_string(),
            fallback_models: vec![
                "gemini-2.0-flash".to_string(),
                "gemini-2.0-flash-lite".to_string(),
            ],
            advanced_markers: vec!["3".to_string(), "2.5".to_string(), "pro".to_string()],
            advanced_tier: TierParams {
                max_output_tokens: 65_536,
                top_k: 64,
            },
            standard_tier: TierParams {
                max_output_tokens: 8_192,
                top_k: 40,
            },
            temperature: 0.7,
            top_p: 0.95,
            primary_retries: 3,
            fallback_retries: 2,
            overload_backoff_base_secs: 2,
            error_retry_delay_secs: 2,
            request_timeout_secs: 300,
        }
    }
}

impl LlmConfig {
    pub fn is_advanced(&self, model: &str) -> bool {
        self.advanced_markers
            .iter()
            .any(|marker| model.contains(marker.as_str()))
    }

    pub fn tier_for(&self, model: &str) -> TierParams {
        if self.is_advanced(model) {
            self.advanced_tier
        } else {
            self.standard_tier
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub chunk_size: usize,
    pub delay_between_chunks_ms: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            chunk_size: 30,
            delay_between_chunks_ms: 0,
        }
    }
}

impl BatchConfig {
    pub fn delay_between_chunks(&self) -> Duration {
        Duration::from_millis(self.delay_between_chunks_ms)
    }
}

impl AppConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self, CoreError> {
        let config: AppConfig = toml::from_str(contents).map_err(ConfigError::from)?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                CoreError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                CoreError::Io(e)
            }
        })?;
        debug!("Loaded configuration from {}", path.display());
        Self::from_toml_str(&contents)
    }

    /// Load `.env`, read the TOML file named by `THREADSIFT_CONFIG` if set,
    /// then overlay secrets from the environment.
    pub fn load() -> Result<Self, CoreError> {
        dotenvy::dotenv().ok();

        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_file(path)?,
            Err(_) => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;

        info!(
            "Configuration loaded: primary model {}, {} fallbacks, chunk size {}",
            config.llm.primary_model,
            config.llm.fallback_models.len(),
            config.batch.chunk_size
        );
        Ok(config)
    }

    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("REDDIT_CLIENT_ID") {
            self.reddit.client_id = Some(value);
        }
        if let Some(value) = lookup("REDDIT_CLIENT_SECRET") {
            self.reddit.client_secret = Some(value);
        }
        if let Some(value) = lookup("REDDIT_USER_AGENT") {
            self.reddit.user_agent = value;
        }
        if let Some(value) = lookup("YOUTUBE_API_KEY") {
            self.youtube.api_key = Some(value);
        }
        if let Some(value) = lookup("GEMINI_API_KEY") {
            self.llm.api_key = Some(value);
        }
        if let Some(value) = lookup("GEMINI_MODEL") {
            self.llm.primary_model = value;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch.chunk_size == 0 {
            return Err(invalid("batch.chunk_size", "0"));
        }
        if self.llm.primary_model.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "llm.primary_model".to_string(),
            });
        }
        if self.llm.primary_retries == 0 {
            return Err(invalid("llm.primary_retries", "0"));
        }
        if self.llm.fallback_retries == 0 {
            return Err(invalid("llm.fallback_retries", "0"));
        }
        if self.reddit.max_comments == 0 {
            return Err(invalid("reddit.max_comments", "0"));
        }
        if self.youtube.max_comments == 0 {
            return Err(invalid("youtube.max_comments", "0"));
        }
        Ok(())
    }

    pub fn require<'a>(value: &'a Option<String>, var_name: &str) -> Result<&'a str, ConfigError> {
        value
            .as_deref()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ConfigError::MissingEnvironmentVariable {
                var_name: var_name.to_string(),
            })
    }
}

fn invalid(field: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
    }
}
