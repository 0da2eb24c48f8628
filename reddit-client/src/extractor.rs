use crate::api::{RedditApiClient, ThreadFetcher};
use crate::auth::{ClientCredentials, TokenCache};
use crate::comments::parse_thread;
use crate::post_url::{is_reddit_post_url, parse_post_id};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use threadsift_core::filter::RedditCommentFilter;
use threadsift_core::{
    AppConfig, ContentMetadata, CoreError, ExtractionResult, Extractor, RedditApiError,
    RedditConfig,
};
use tracing::{info, warn};

pub struct RedditExtractor<F: ThreadFetcher = RedditApiClient> {
    fetcher: F,
    tokens: Arc<TokenCache>,
    filter: RedditCommentFilter,
    fetch_limit: u32,
    fetch_depth: u32,
}

impl RedditExtractor<RedditApiClient> {
    /// Production wiring: client-credentials token cache plus the HTTP client.
    pub fn from_config(config: &RedditConfig) -> Result<Self, CoreError> {
        let client_id = AppConfig::require(&config.client_id, "REDDIT_CLIENT_ID")?;
        let client_secret = AppConfig::require(&config.client_secret, "REDDIT_CLIENT_SECRET")?;

        let source = ClientCredentials::new(
            client_id.to_string(),
            client_secret.to_string(),
            &config.user_agent,
        )?;
        let tokens = Arc::new(TokenCache::new(Arc::new(source)));
        let client = RedditApiClient::new(&config.user_agent)?;

        Ok(Self::new(client, tokens, config))
    }
}

impl<F: ThreadFetcher> RedditExtractor<F> {
    pub fn new(fetcher: F, tokens: Arc<TokenCache>, config: &RedditConfig) -> Self {
        Self {
            fetcher,
            tokens,
            filter: RedditCommentFilter::new(config.max_comments),
            fetch_limit: config.fetch_limit,
            fetch_depth: config.fetch_depth,
        }
    }

    pub fn token_cache(&self) -> &Arc<TokenCache> {
        &self.tokens
    }

    /// One fetch, and on a 401 a second one with a freshly issued token.
    async fn fetch_with_refresh(&self, post_id: &str) -> Result<Value, CoreError> {
        let token = self.tokens.get_token().await?;
        match self
            .fetcher
            .fetch_thread(&token, post_id, self.fetch_limit, self.fetch_depth)
            .await
        {
            Err(CoreError::RedditApi(RedditApiError::InvalidToken)) => {
                warn!("Reddit rejected token for post {}, refreshing once", post_id);
                self.tokens.invalidate().await;
                let token = self.tokens.get_token().await?;
                self.fetcher
                    .fetch_thread(&token, post_id, self.fetch_limit, self.fetch_depth)
                    .await
            }
            other => other,
        }
    }
}

#[async_trait]
impl<F: ThreadFetcher> Extractor for RedditExtractor<F> {
    async fn extract(&self, url: &str) -> Result<ExtractionResult, CoreError> {
        let post_id = parse_post_id(url).ok_or_else(|| CoreError::invalid_url(url))?;

        let body = self.fetch_with_refresh(&post_id).await?;
        let thread = parse_thread(&post_id, &body)?;
        let outcome = self.filter.filter(&thread.comments);

        info!(
            "Extracted {} of {} comments from Reddit post {}",
            outcome.extraction_stats.extracted, outcome.extraction_stats.total, post_id
        );

        Ok(ExtractionResult {
            metadata: ContentMetadata::Reddit(thread.post),
            valuable_comments: outcome.valuable_comments,
            extraction_stats: outcome.extraction_stats,
        })
    }

    fn accepts(&self, url: &str) -> bool {
        is_reddit_post_url(url)
    }
}
