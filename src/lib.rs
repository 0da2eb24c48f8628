//! URL routing across the Reddit and YouTube extractors.

use async_trait::async_trait;
use futures::future::join_all;
use reddit_client::{is_reddit_post_url, RedditExtractor};
use std::sync::Arc;
use threadsift_core::{
    AppConfig, BatchConfig, BatchExtractor, BatchOutcome, ConfigError, CoreError, ExtractResponse,
    ExtractionResult, Extractor, Source,
};
use tracing::{info, warn};
use youtube_client::{is_youtube_video_url, QuotaCounter, YouTubeExtractor};

pub use llm_interface;
pub use reddit_client;
pub use threadsift_core;
pub use youtube_client;

/// Which upstream a URL belongs to, from its shape alone.
pub fn detect_source(url: &str) -> Option<Source> {
    if is_reddit_post_url(url) {
        Some(Source::Reddit)
    } else if is_youtube_video_url(url) {
        Some(Source::YouTube)
    } else {
        None
    }
}

/// A source without credentials remembers the variable that would enable it.
enum Slot {
    Ready(Box<dyn Extractor>),
    Missing { var_name: String },
}

impl Slot {
    fn build<E>(source: Source, result: Result<E, CoreError>) -> Result<Self, CoreError>
    where
        E: Extractor + 'static,
    {
        match result {
            Ok(extractor) => Ok(Slot::Ready(Box::new(extractor))),
            Err(CoreError::Config(ConfigError::MissingEnvironmentVariable { var_name })) => {
                warn!("{:?} extraction disabled: {} is not set", source, var_name);
                Ok(Slot::Missing { var_name })
            }
            Err(e) => Err(e),
        }
    }
}

pub struct SourceRouter {
    reddit: Slot,
    youtube: Slot,
}

impl SourceRouter {
    pub fn new(reddit: Box<dyn Extractor>, youtube: Box<dyn Extractor>) -> Self {
        Self {
            reddit: Slot::Ready(reddit),
            youtube: Slot::Ready(youtube),
        }
    }

    /// Builds whichever extractors have credentials. A source without them
    /// fails per URL with a configuration error instead of at startup.
    pub fn from_config(config: &AppConfig, quota: Arc<QuotaCounter>) -> Result<Self, CoreError> {
        Ok(Self {
            reddit: Slot::build(Source::Reddit, RedditExtractor::from_config(&config.reddit))?,
            youtube: Slot::build(
                Source::YouTube,
                YouTubeExtractor::from_config(&config.youtube, quota),
            )?,
        })
    }

    fn extractor_for(&self, url: &str) -> Result<&dyn Extractor, CoreError> {
        let slot = match detect_source(url) {
            Some(Source::Reddit) => &self.reddit,
            Some(Source::YouTube) => &self.youtube,
            None => return Err(CoreError::invalid_url(url)),
        };
        match slot {
            Slot::Ready(extractor) => Ok(extractor.as_ref()),
            Slot::Missing { var_name } => Err(CoreError::Config(
                ConfigError::MissingEnvironmentVariable {
                    var_name: var_name.clone(),
                },
            )),
        }
    }

    /// Route-boundary form of [`Extractor::extract`]: never fails.
    pub async fn extract_envelope(&self, url: &str) -> ExtractResponse {
        ExtractResponse::from_result(self.extract(url).await)
    }

    /// All URLs at once, for a single combined analysis.
    pub async fn extract_many(&self, urls: &[String]) -> Vec<ExtractResponse> {
        info!("Extracting {} URLs concurrently", urls.len());
        join_all(urls.iter().map(|url| self.extract_envelope(url))).await
    }

    pub async fn batch_extract(&self, urls: &[String], config: &BatchConfig) -> BatchOutcome {
        BatchExtractor::new(self, config).batch_extract(urls).await
    }
}

#[async_trait]
impl Extractor for SourceRouter {
    async fn extract(&self, url: &str) -> Result<ExtractionResult, CoreError> {
        self.extractor_for(url)?.extract(url).await
    }

    fn accepts(&self, url: &str) -> bool {
        detect_source(url).is_some()
    }
}
