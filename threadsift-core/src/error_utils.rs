use crate::error::*;
use std::time::Duration;
use tracing::{error, warn};

/// Classification shared by every error in the workspace.
///
/// `error_code` is the stable machine-readable tag placed in response
/// envelopes; `user_friendly_message` is the human one.
pub trait ErrorExt: std::fmt::Display {
    fn is_retryable(&self) -> bool;
    fn retry_after(&self) -> Option<Duration>;
    fn user_friendly_message(&self) -> String;
    fn error_code(&self) -> &'static str;

    /// Transient failures log at warn, everything else at error.
    fn log(&self, context: &str) {
        if self.is_retryable() {
            warn!("{}: {} [{}]", context, self, self.error_code());
        } else {
            error!("{}: {} [{}]", context, self, self.error_code());
        }
    }
}

impl ErrorExt for CoreError {
    fn is_retryable(&self) -> bool {
        match self {
            CoreError::RedditApi(e) => e.is_retryable(),
            CoreError::YouTubeApi(e) => e.is_retryable(),
            CoreError::Llm(e) => e.is_retryable(),
            CoreError::Network(_) => true,
            _ => false,
        }
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            CoreError::RedditApi(e) => e.retry_after(),
            CoreError::YouTubeApi(e) => e.retry_after(),
            CoreError::Llm(e) => e.retry_after(),
            CoreError::Network(_) => Some(Duration::from_secs(5)),
            _ => None,
        }
    }

    fn user_friendly_message(&self) -> String {
        match self {
            CoreError::RedditApi(e) => e.user_friendly_message(),
            CoreError::YouTubeApi(e) => e.user_friendly_message(),
            CoreError::Llm(e) => e.user_friendly_message(),
            CoreError::Config(e) => e.user_friendly_message(),
            CoreError::Network(_) => {
                "Could not reach the upstream service. Check your connection.".to_string()
            }
            CoreError::InvalidUrl { url } => format!(
                "'{}' is not a supported Reddit post or YouTube video URL.",
                url
            ),
            CoreError::Io(_) | CoreError::Internal { .. } => {
                "An unexpected error occurred.".to_string()
            }
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            CoreError::RedditApi(e) => e.error_code(),
            CoreError::YouTubeApi(e) => e.error_code(),
            CoreError::Llm(e) => e.error_code(),
            CoreError::Config(e) => e.error_code(),
            CoreError::Io(_) => "IO",
            CoreError::Network(_) => "NETWORK",
            CoreError::InvalidUrl { .. } => "INVALID_URL",
            CoreError::Internal { .. } => "INTERNAL",
        }
    }
}

impl ErrorExt for RedditApiError {
    fn is_retryable(&self) -> bool {
        matches!(
            self,
            RedditApiError::RateLimitExceeded { .. }
                | RedditApiError::RequestTimeout
                | RedditApiError::ServerError { .. }
        )
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            RedditApiError::RateLimitExceeded { retry_after } => {
                Some(Duration::from_secs(*retry_after))
            }
            RedditApiError::RequestTimeout | RedditApiError::ServerError { .. } => {
                Some(Duration::from_secs(30))
            }
            _ => None,
        }
    }

    fn user_friendly_message(&self) -> String {
        match self {
            RedditApiError::AuthenticationFailed { .. } => {
                "Reddit rejected the client credentials.".to_string()
            }
            RedditApiError::InvalidToken => {
                "Reddit authentication token is invalid or expired.".to_string()
            }
            RedditApiError::RateLimitExceeded { retry_after } => format!(
                "Reddit is rate limiting requests. Try again in {} seconds.",
                retry_after
            ),
            RedditApiError::Forbidden { resource } => {
                format!("{} is private, quarantined or removed.", resource)
            }
            RedditApiError::PostNotFound { post_id } => {
                format!("Reddit post {} could not be found.", post_id)
            }
            RedditApiError::NotFound { resource } => format!("{} does not exist.", resource),
            RedditApiError::RequestTimeout => "Reddit did not answer in time.".to_string(),
            RedditApiError::InvalidResponse { .. } | RedditApiError::ServerError { .. } => {
                "Reddit returned an unexpected response.".to_string()
            }
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            RedditApiError::AuthenticationFailed { .. } => "REDDIT_AUTH_FAILED",
            RedditApiError::RateLimitExceeded { .. } => "REDDIT_RATE_LIMIT",
            RedditApiError::Forbidden { .. } => "REDDIT_FORBIDDEN",
            RedditApiError::PostNotFound { .. } => "REDDIT_POST_NOT_FOUND",
            RedditApiError::NotFound { .. } => "REDDIT_NOT_FOUND",
            RedditApiError::InvalidToken => "REDDIT_INVALID_TOKEN",
            RedditApiError::RequestTimeout => "REDDIT_TIMEOUT",
            RedditApiError::InvalidResponse { .. } => "REDDIT_INVALID_RESPONSE",
            RedditApiError::ServerError { .. } => "REDDIT_SERVER_ERROR",
        }
    }
}

impl ErrorExt for YouTubeApiError {
    fn is_retryable(&self) -> bool {
        matches!(
            self,
            YouTubeApiError::RateLimitExceeded
                | YouTubeApiError::RequestTimeout
                | YouTubeApiError::ServerError { .. }
        )
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            YouTubeApiError::RateLimitExceeded => Some(Duration::from_secs(60)),
            YouTubeApiError::RequestTimeout | YouTubeApiError::ServerError { .. } => {
                Some(Duration::from_secs(30))
            }
            _ => None,
        }
    }

    fn user_friendly_message(&self) -> String {
        match self {
            YouTubeApiError::InvalidApiKey => "The YouTube API key was rejected.".to_string(),
            YouTubeApiError::QuotaExceeded { .. } => {
                "The daily YouTube API quota is used up. It resets at midnight Pacific time."
                    .to_string()
            }
            YouTubeApiError::RateLimitExceeded => {
                "YouTube is rate limiting requests. Wait a minute and retry.".to_string()
            }
            YouTubeApiError::VideoNotFound { video_id } => {
                format!("YouTube video {} could not be found.", video_id)
            }
            YouTubeApiError::CommentsDisabled { video_id } => {
                format!("Comments are disabled for video {}.", video_id)
            }
            YouTubeApiError::Forbidden { .. } => {
                "YouTube refused access to this resource.".to_string()
            }
            YouTubeApiError::RequestTimeout => "YouTube did not answer in time.".to_string(),
            YouTubeApiError::InvalidResponse { .. } | YouTubeApiError::ServerError { .. } => {
                "YouTube returned an unexpected response.".to_string()
            }
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            YouTubeApiError::InvalidApiKey => "YOUTUBE_INVALID_API_KEY",
            YouTubeApiError::QuotaExceeded { .. } => "YOUTUBE_QUOTA_EXCEEDED",
            YouTubeApiError::RateLimitExceeded => "YOUTUBE_RATE_LIMIT",
            YouTubeApiError::VideoNotFound { .. } => "YOUTUBE_VIDEO_NOT_FOUND",
            YouTubeApiError::CommentsDisabled { .. } => "YOUTUBE_COMMENTS_DISABLED",
            YouTubeApiError::Forbidden { .. } => "YOUTUBE_FORBIDDEN",
            YouTubeApiError::RequestTimeout => "YOUTUBE_TIMEOUT",
            YouTubeApiError::InvalidResponse { .. } => "YOUTUBE_INVALID_RESPONSE",
            YouTubeApiError::ServerError { .. } => "YOUTUBE_SERVER_ERROR",
        }
    }
}

impl ErrorExt for LlmError {
    /// Quota and missing models never recover by waiting.
    fn is_retryable(&self) -> bool {
        !matches!(
            self,
            LlmError::RateLimitExceeded { .. } | LlmError::ModelNotAvailable { .. }
        )
    }

    fn retry_after(&self) -> Option<Duration> {
        self.is_retryable().then(|| Duration::from_secs(2))
    }

    fn user_friendly_message(&self) -> String {
        match self {
            LlmError::InvalidApiKey { provider } => {
                format!("The {} API key was rejected.", provider)
            }
            LlmError::RateLimitExceeded { model } => format!("{} is out of quota.", model),
            LlmError::ModelNotAvailable { model } => {
                format!("Model '{}' is not available.", model)
            }
            LlmError::ServiceUnavailable { model } => {
                format!("{} is temporarily overloaded.", model)
            }
            LlmError::RequestTimeout { model } => format!("{} did not answer in time.", model),
            LlmError::InvalidResponseFormat { model, .. } => {
                format!("{} returned an unreadable answer.", model)
            }
            LlmError::RequestFailed { model, .. } | LlmError::Transport { model, .. } => {
                format!("The request to {} failed.", model)
            }
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            LlmError::InvalidApiKey { .. } => "LLM_INVALID_API_KEY",
            LlmError::RateLimitExceeded { .. } => "LLM_RATE_LIMIT",
            LlmError::ModelNotAvailable { .. } => "LLM_MODEL_NOT_AVAILABLE",
            LlmError::ServiceUnavailable { .. } => "LLM_SERVICE_UNAVAILABLE",
            LlmError::RequestTimeout { .. } => "LLM_TIMEOUT",
            LlmError::InvalidResponseFormat { .. } => "LLM_INVALID_RESPONSE",
            LlmError::RequestFailed { .. } => "LLM_REQUEST_FAILED",
            LlmError::Transport { .. } => "LLM_TRANSPORT",
        }
    }
}

impl ErrorExt for ConfigError {
    fn is_retryable(&self) -> bool {
        false
    }

    fn retry_after(&self) -> Option<Duration> {
        None
    }

    fn user_friendly_message(&self) -> String {
        match self {
            ConfigError::FileNotFound { path } => format!("Config file '{}' was not found.", path),
            ConfigError::MissingField { field } => {
                format!("Required config field '{}' is missing.", field)
            }
            ConfigError::InvalidValue { field, value } => {
                format!("'{}' is not a valid value for config field '{}'.", value, field)
            }
            ConfigError::MissingEnvironmentVariable { var_name } => {
                format!("Set {} to enable this source.", var_name)
            }
            ConfigError::Parse(e) => format!("Config file could not be parsed: {}", e),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            ConfigError::FileNotFound { .. } => "CONFIG_FILE_NOT_FOUND",
            ConfigError::MissingField { .. } => "CONFIG_MISSING_FIELD",
            ConfigError::InvalidValue { .. } => "CONFIG_INVALID_VALUE",
            ConfigError::MissingEnvironmentVariable { .. } => "CONFIG_MISSING_ENV_VAR",
            ConfigError::Parse(_) => "CONFIG_PARSE_ERROR",
        }
    }
}
