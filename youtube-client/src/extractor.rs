use crate::api::{SearchHit, VideoSource, YouTubeApiClient};
use crate::quota::QuotaCounter;
use crate::video_url::{is_youtube_video_url, parse_video_id};
use async_trait::async_trait;
use std::sync::Arc;
use threadsift_core::filter::YouTubeCommentFilter;
use threadsift_core::{
    AppConfig, ContentMetadata, CoreError, ExtractionResult, Extractor, RawComment,
    YouTubeConfig,
};
use tracing::{debug, info, warn};

pub struct YouTubeExtractor<S: VideoSource = YouTubeApiClient> {
    source: S,
    filter: YouTubeCommentFilter,
    max_comment_pages: u32,
    max_replies_per_thread: usize,
}

impl YouTubeExtractor<YouTubeApiClient> {
    /// API-key client sharing `quota` with any other client in the process.
    pub fn from_config(config: &YouTubeConfig, quota: Arc<QuotaCounter>) -> Result<Self, CoreError> {
        let api_key = AppConfig::require(&config.api_key, "YOUTUBE_API_KEY")?;
        let client = YouTubeApiClient::new(api_key, quota)?;
        Ok(Self::new(client, config))
    }
}

impl<S: VideoSource> YouTubeExtractor<S> {
    pub fn new(source: S, config: &YouTubeConfig) -> Self {
        Self {
            source,
            filter: YouTubeCommentFilter::new(config.max_comments),
            max_comment_pages: config.max_comment_pages,
            max_replies_per_thread: config.max_replies_per_thread,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Top-level comments in page order, each followed by its first replies.
    ///
    /// A failed page ends pagination; whatever was collected is kept.
    pub async fn collect_comments(&self, video_id: &str) -> Vec<RawComment> {
        let mut comments = Vec::new();
        let mut page_token: Option<String> = None;

        for page in 0..self.max_comment_pages {
            let result = self
                .source
                .comment_threads(video_id, page_token.as_deref())
                .await;
            let page_data = match result {
                Ok(page_data) => page_data,
                Err(e) => {
                    warn!(
                        "Stopping comment pagination for {} after {} pages: {}",
                        video_id, page, e
                    );
                    break;
                }
            };

            for thread in page_data.threads {
                comments.push(thread.top_level);
                comments.extend(thread.replies.into_iter().take(self.max_replies_per_thread));
            }
            debug!("Page {} of {}: {} comments so far", page + 1, video_id, comments.len());

            match page_data.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        comments
    }

    pub async fn search(&self, query: &str, max_results: u32) -> Result<Vec<SearchHit>, CoreError> {
        self.source.search(query, max_results).await
    }
}

#[async_trait]
impl<S: VideoSource> Extractor for YouTubeExtractor<S> {
    async fn extract(&self, url: &str) -> Result<ExtractionResult, CoreError> {
        let video_id = parse_video_id(url).ok_or_else(|| CoreError::invalid_url(url))?;

        let video = self.source.video(&video_id).await?;
        let comments = self.collect_comments(&video_id).await;
        let outcome = self.filter.filter(&comments);

        info!(
            "Extracted {} of {} comments from YouTube video {}",
            outcome.extraction_stats.extracted, outcome.extraction_stats.total, video_id
        );

        Ok(ExtractionResult {
            metadata: ContentMetadata::YouTube(video),
            valuable_comments: outcome.valuable_comments,
            extraction_stats: outcome.extraction_stats,
        })
    }

    fn accepts(&self, url: &str) -> bool {
        is_youtube_video_url(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{CommentThread, CommentThreadPage};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use threadsift_core::{YouTubeApiError, YouTubeVideo};

    const URL: &str = "https://youtu.be/dQw4w9WgXcQ";

    /// Pages keyed by the token that requests them (`""` for the first).
    struct FakeSource {
        video_missing: bool,
        pages: HashMap<String, Result<CommentThreadPage, YouTubeApiError>>,
        page_calls: AtomicUsize,
    }

    impl FakeSource {
        fn new() -> Self {
            Self {
                video_missing: false,
                pages: HashMap::new(),
                page_calls: AtomicUsize::new(0),
            }
        }

        fn page(mut self, token: &str, page: Result<CommentThreadPage, YouTubeApiError>) -> Self {
            self.pages.insert(token.to_string(), page);
            self
        }
    }

    #[async_trait]
    impl VideoSource for FakeSource {
        async fn video(&self, video_id: &str) -> Result<YouTubeVideo, CoreError> {
            if self.video_missing {
                return Err(YouTubeApiError::VideoNotFound {
                    video_id: video_id.to_string(),
                }
                .into());
            }
            Ok(YouTubeVideo {
                id: video_id.to_string(),
                title: "Lifetimes explained".to_string(),
                description: String::new(),
                channel_id: "UC1".to_string(),
                channel_title: "Channel".to_string(),
                url: format!("https://www.youtube.com/watch?v={video_id}"),
                published_at: None,
                view_count: 1000,
                like_count: 100,
                comment_count: 10,
            })
        }

        async fn comment_threads(
            &self,
            _video_id: &str,
            page_token: Option<&str>,
        ) -> Result<CommentThreadPage, CoreError> {
            self.page_calls.fetch_add(1, Ordering::SeqCst);
            match self.pages.get(page_token.unwrap_or_default()) {
                Some(Ok(page)) => Ok(page.clone()),
                Some(Err(e)) => Err(e.clone().into()),
                None => Ok(CommentThreadPage::default()),
            }
        }

        async fn search(&self, query: &str, _max_results: u32) -> Result<Vec<SearchHit>, CoreError> {
            Ok(vec![SearchHit {
                video_id: "dQw4w9WgXcQ".to_string(),
                title: format!("About {query}"),
                channel_title: "Channel".to_string(),
                published_at: None,
            }])
        }
    }

    fn comment(id: &str, body: &str, likes: i64, reply_count: u32, is_reply: bool) -> RawComment {
        RawComment {
            id: id.to_string(),
            author: format!("@{id}"),
            body: body.to_string(),
            score: likes,
            created_at: None,
            parent_id: None,
            depth: u32::from(is_reply),
            reply_count,
            award_count: 0,
            is_reply,
        }
    }

    fn thread(id: &str, likes: i64, replies: usize) -> CommentThread {
        let body = format!("{id} explains the borrow checker in a way that finally clicked for me");
        CommentThread {
            top_level: comment(id, &body, likes, replies as u32, false),
            replies: (0..replies)
                .map(|i| comment(&format!("{id}.r{i}"), "a short reply here", 0, 0, true))
                .collect(),
        }
    }

    fn page(threads: Vec<CommentThread>, next: Option<&str>) -> CommentThreadPage {
        CommentThreadPage {
            threads,
            next_page_token: next.map(str::to_string),
        }
    }

    fn extractor(source: FakeSource, max_pages: u32) -> YouTubeExtractor<FakeSource> {
        let config = YouTubeConfig {
            max_comment_pages: max_pages,
            max_replies_per_thread: 2,
            ..YouTubeConfig::default()
        };
        YouTubeExtractor::new(source, &config)
    }

    #[tokio::test]
    async fn test_replies_interleaved_and_capped() {
        let source = FakeSource::new().page("", Ok(page(vec![thread("a", 10, 4), thread("b", 3, 0)], None)));
        let extractor = extractor(source, 10);

        let comments = extractor.collect_comments("dQw4w9WgXcQ").await;
        let ids: Vec<_> = comments.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "a.r0", "a.r1", "b"]);
        assert!(comments[1].is_reply);
        assert_eq!(comments[1].depth, 1);
    }

    #[tokio::test]
    async fn test_pagination_stops_at_page_cap() {
        let source = FakeSource::new()
            .page("", Ok(page(vec![thread("a", 10, 0)], Some("p2"))))
            .page("p2", Ok(page(vec![thread("b", 10, 0)], Some("p3"))))
            .page("p3", Ok(page(vec![thread("c", 10, 0)], None)));
        let extractor = extractor(source, 2);

        let comments = extractor.collect_comments("dQw4w9WgXcQ").await;
        assert_eq!(comments.len(), 2);
        assert_eq!(extractor.source().page_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failed_page_keeps_collected_comments() {
        let source = FakeSource::new()
            .page("", Ok(page(vec![thread("a", 10, 0), thread("b", 8, 0)], Some("p2"))))
            .page(
                "p2",
                Err(YouTubeApiError::QuotaExceeded {
                    used: 10_000,
                    limit: 10_000,
                    requested: 1,
                }),
            );
        let extractor = extractor(source, 10);

        let result = extractor.extract(URL).await.unwrap();
        assert_eq!(result.extraction_stats.total, 2);
        assert_eq!(result.valuable_comments.len(), 2);
        assert_eq!(result.valuable_comments[0].id, "a");
    }

    #[tokio::test]
    async fn test_comments_disabled_still_returns_video() {
        let source = FakeSource::new().page(
            "",
            Err(YouTubeApiError::CommentsDisabled {
                video_id: "dQw4w9WgXcQ".to_string(),
            }),
        );
        let result = extractor(source, 10).extract(URL).await.unwrap();

        assert_eq!(result.metadata.title(), "Lifetimes explained");
        assert!(result.valuable_comments.is_empty());
        assert_eq!(result.extraction_stats.percentage_kept, 0);
    }

    #[tokio::test]
    async fn test_missing_video_fails_the_call() {
        let mut source = FakeSource::new();
        source.video_missing = true;
        let err = extractor(source, 10).extract(URL).await.unwrap_err();
        assert!(matches!(
            err,
            CoreError::YouTubeApi(YouTubeApiError::VideoNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_invalid_url() {
        let extractor = extractor(FakeSource::new(), 10);
        let err = extractor
            .extract("https://www.reddit.com/r/rust/comments/abc123/")
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidUrl { .. }));
        assert_eq!(extractor.source().page_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_search_delegates() {
        let hits = extractor(FakeSource::new(), 10)
            .search("rust lifetimes", 5)
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "About rust lifetimes");
    }

    #[test]
    fn test_from_config_requires_api_key() {
        let quota = Arc::new(QuotaCounter::new(10_000));
        let result = YouTubeExtractor::from_config(&YouTubeConfig::default(), quota);
        assert!(matches!(result.err(), Some(CoreError::Config(_))));
    }
}
