use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Reddit API error: {0}")]
    RedditApi(#[from] RedditApiError),

    #[error("YouTube API error: {0}")]
    YouTubeApi(#[from] YouTubeApiError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Unrecognized URL: {url}")]
    InvalidUrl { url: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl CoreError {
    pub fn invalid_url(url: impl Into<String>) -> Self {
        CoreError::InvalidUrl { url: url.into() }
    }
}

#[derive(Error, Debug, Clone)]
pub enum RedditApiError {
    #[error("Authentication failed: {reason}")]
    AuthenticationFailed { reason: String },

    #[error("Rate limit exceeded. Retry after {retry_after} seconds")]
    RateLimitExceeded { retry_after: u64 },

    #[error("Forbidden access to resource: {resource}")]
    Forbidden { resource: String },

    #[error("Post not found: {post_id}")]
    PostNotFound { post_id: String },

    #[error("Resource not found: {resource}")]
    NotFound { resource: String },

    #[error("Invalid OAuth token")]
    InvalidToken,

    #[error("Request timeout")]
    RequestTimeout,

    #[error("Invalid API response: {details}")]
    InvalidResponse { details: String },

    #[error("Server error: {status_code}")]
    ServerError { status_code: u16 },
}

#[derive(Error, Debug, Clone)]
pub enum YouTubeApiError {
    #[error("API key invalid or missing")]
    InvalidApiKey,

    #[error("Daily quota exhausted: {used}/{limit} units used, {requested} requested")]
    QuotaExceeded { used: u64, limit: u64, requested: u64 },

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Video not found: {video_id}")]
    VideoNotFound { video_id: String },

    #[error("Comments are disabled for video {video_id}")]
    CommentsDisabled { video_id: String },

    #[error("Forbidden: {reason}")]
    Forbidden { reason: String },

    #[error("Request timeout")]
    RequestTimeout,

    #[error("Invalid API response: {details}")]
    InvalidResponse { details: String },

    #[error("Server error: {status_code}")]
    ServerError { status_code: u16 },
}

#[derive(Error, Debug, Clone)]
pub enum LlmError {
    #[error("API key invalid or missing for {provider}")]
    InvalidApiKey { provider: String },

    #[error("Quota exceeded for {model}")]
    RateLimitExceeded { model: String },

    #[error("Model not available: {model}")]
    ModelNotAvailable { model: String },

    #[error("Model overloaded: {model}")]
    ServiceUnavailable { model: String },

    #[error("Request timeout for {model}")]
    RequestTimeout { model: String },

    #[error("Unexpected response format from {model}: {details}")]
    InvalidResponseFormat { model: String, details: String },

    #[error("Request to {model} failed with status {status_code}: {body}")]
    RequestFailed {
        model: String,
        status_code: u16,
        body: String,
    },

    #[error("Transport error calling {model}: {message}")]
    Transport { model: String, message: String },
}

impl LlmError {
    /// HTTP-shaped status code for this failure, when there is one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            LlmError::InvalidApiKey { .. } => Some(401),
            LlmError::RateLimitExceeded { .. } => Some(429),
            LlmError::ModelNotAvailable { .. } => Some(404),
            LlmError::ServiceUnavailable { .. } => Some(503),
            LlmError::RequestFailed { status_code, .. } => Some(*status_code),
            LlmError::RequestTimeout { .. }
            | LlmError::InvalidResponseFormat { .. }
            | LlmError::Transport { .. } => None,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    #[error("Environment variable not set: {var_name}")]
    MissingEnvironmentVariable { var_name: String },

    #[error("Configuration parsing error: {0}")]
    Parse(#[from] toml::de::Error),
}
