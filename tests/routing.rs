use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use threadsift::threadsift_core::{
    BatchConfig, ContentMetadata, CoreError, ExtractionResult, ExtractionStats, Extractor,
    YouTubeApiError, YouTubeVideo,
};
use threadsift::SourceRouter;

/// Answers every URL with a video titled after it, except ids listed in
/// `disabled`, which report comments as disabled.
struct CountingExtractor {
    calls: Arc<AtomicUsize>,
    disabled: Vec<&'static str>,
}

#[async_trait]
impl Extractor for CountingExtractor {
    async fn extract(&self, url: &str) -> Result<ExtractionResult, CoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(id) = self.disabled.iter().find(|id| url.contains(*id)) {
            return Err(YouTubeApiError::CommentsDisabled {
                video_id: id.to_string(),
            }
            .into());
        }
        Ok(ExtractionResult {
            metadata: ContentMetadata::YouTube(YouTubeVideo {
                id: url.to_string(),
                title: url.to_string(),
                description: String::new(),
                channel_id: String::new(),
                channel_title: String::new(),
                url: url.to_string(),
                published_at: None,
                view_count: 0,
                like_count: 0,
                comment_count: 0,
            }),
            valuable_comments: Vec::new(),
            extraction_stats: ExtractionStats::default(),
        })
    }

    fn accepts(&self, _url: &str) -> bool {
        true
    }
}

fn router(disabled: Vec<&'static str>) -> (SourceRouter, Arc<AtomicUsize>, Arc<AtomicUsize>) {
    let reddit_calls = Arc::new(AtomicUsize::new(0));
    let youtube_calls = Arc::new(AtomicUsize::new(0));
    let router = SourceRouter::new(
        Box::new(CountingExtractor {
            calls: reddit_calls.clone(),
            disabled: Vec::new(),
        }),
        Box::new(CountingExtractor {
            calls: youtube_calls.clone(),
            disabled,
        }),
    );
    (router, reddit_calls, youtube_calls)
}

#[tokio::test]
async fn test_mixed_batch_routes_and_collects_failures() {
    let (router, reddit_calls, youtube_calls) = router(vec!["aaaaaaaaaaa"]);
    let urls: Vec<String> = vec![
        "https://www.reddit.com/r/rust/comments/abc123/borrowck/".into(),
        "https://youtu.be/aaaaaaaaaaa".into(),
        "https://example.com/not-supported".into(),
        "https://www.youtube.com/watch?v=bbbbbbbbbbb".into(),
        "https://redd.it/def456".into(),
    ];
    let config = BatchConfig {
        chunk_size: 2,
        delay_between_chunks_ms: 0,
    };

    let outcome = router.batch_extract(&urls, &config).await;

    assert_eq!(outcome.posts_data.len(), 3);
    assert_eq!(outcome.failures.len(), 2);
    assert_eq!(outcome.failures[0].url, urls[1]);
    assert!(outcome.failures[0].error.contains("disabled"));
    assert_eq!(outcome.failures[1].url, urls[2]);
    assert_eq!(reddit_calls.load(Ordering::SeqCst), 2);
    assert_eq!(youtube_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_extract_many_keeps_input_order() {
    let (router, _, _) = router(Vec::new());
    let urls: Vec<String> = vec![
        "https://youtu.be/ccccccccccc".into(),
        "https://redd.it/xyz789".into(),
        "ftp://nope".into(),
    ];

    let responses = router.extract_many(&urls).await;

    assert_eq!(responses.len(), 3);
    assert!(responses[0].success);
    assert_eq!(
        responses[0].data.as_ref().map(|d| d.metadata.title()),
        Some(urls[0].as_str())
    );
    assert!(responses[1].success);
    assert!(!responses[2].success);
    assert_eq!(responses[2].error_code.as_deref(), Some("INVALID_URL"));
}
