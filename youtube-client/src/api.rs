use crate::quota::{QuotaCounter, LIST_COST, SEARCH_COST};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use threadsift_core::{CoreError, RawComment, YouTubeApiError, YouTubeVideo};
use tracing::{debug, error, info};

const YOUTUBE_API_BASE: &str = "https://www.googleapis.com/youtube/v3";
const COMMENT_PAGE_SIZE: &str = "100";

/// A top-level comment with the replies delivered alongside it.
#[derive(Debug, Clone, PartialEq)]
pub struct CommentThread {
    pub top_level: RawComment,
    pub replies: Vec<RawComment>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommentThreadPage {
    pub threads: Vec<CommentThread>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    pub video_id: String,
    pub title: String,
    pub channel_title: String,
    pub published_at: Option<DateTime<Utc>>,
}

/// The three list endpoints the extractor needs.
#[async_trait]
pub trait VideoSource: Send + Sync {
    async fn video(&self, video_id: &str) -> Result<YouTubeVideo, CoreError>;

    async fn comment_threads(
        &self,
        video_id: &str,
        page_token: Option<&str>,
    ) -> Result<CommentThreadPage, CoreError>;

    async fn search(&self, query: &str, max_results: u32) -> Result<Vec<SearchHit>, CoreError>;
}

// Wire shapes. The API sends counters as decimal strings.

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
struct ListResponse<T> {
    #[serde(default)]
    items: Vec<T>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VideoItem {
    id: String,
    snippet: VideoSnippet,
    statistics: Option<VideoStatistics>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct VideoSnippet {
    published_at: Option<String>,
    channel_id: String,
    title: String,
    description: String,
    channel_title: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct VideoStatistics {
    view_count: Option<String>,
    like_count: Option<String>,
    comment_count: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ThreadItem {
    snippet: ThreadSnippet,
    replies: Option<ThreadReplies>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThreadSnippet {
    top_level_comment: CommentResource,
    #[serde(default)]
    total_reply_count: u32,
}

#[derive(Debug, Deserialize)]
struct ThreadReplies {
    #[serde(default)]
    comments: Vec<CommentResource>,
}

#[derive(Debug, Deserialize)]
struct CommentResource {
    id: String,
    snippet: CommentSnippet,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct CommentSnippet {
    author_display_name: String,
    text_original: Option<String>,
    text_display: String,
    like_count: i64,
    published_at: Option<String>,
    parent_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchId,
    snippet: VideoSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchId {
    video_id: Option<String>,
}

fn parse_timestamp(raw: Option<&str>) -> Option<DateTime<Utc>> {
    raw.and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

fn parse_count(raw: Option<&String>) -> u64 {
    raw.and_then(|v| v.parse().ok()).unwrap_or(0)
}

impl VideoItem {
    fn into_video(self) -> YouTubeVideo {
        let statistics = self.statistics.unwrap_or_default();
        YouTubeVideo {
            url: format!("https://www.youtube.com/watch?v={}", self.id),
            id: self.id,
            title: self.snippet.title,
            description: self.snippet.description,
            channel_id: self.snippet.channel_id,
            channel_title: self.snippet.channel_title,
            published_at: parse_timestamp(self.snippet.published_at.as_deref()),
            view_count: parse_count(statistics.view_count.as_ref()),
            like_count: parse_count(statistics.like_count.as_ref()),
            comment_count: parse_count(statistics.comment_count.as_ref()),
        }
    }
}

impl CommentResource {
    fn into_comment(self, depth: u32, reply_count: u32, parent_id: Option<String>) -> RawComment {
        let snippet = self.snippet;
        RawComment {
            id: self.id,
            author: snippet.author_display_name,
            body: snippet.text_original.unwrap_or(snippet.text_display),
            score: snippet.like_count,
            created_at: parse_timestamp(snippet.published_at.as_deref()),
            parent_id: snippet.parent_id.or(parent_id),
            depth,
            reply_count,
            award_count: 0,
            is_reply: depth > 0,
        }
    }
}

impl ThreadItem {
    fn into_thread(self) -> CommentThread {
        let top = self.snippet.top_level_comment;
        let top_id = top.id.clone();
        let replies = self
            .replies
            .map(|r| r.comments)
            .unwrap_or_default()
            .into_iter()
            .map(|reply| reply.into_comment(1, 0, Some(top_id.clone())))
            .collect();

        CommentThread {
            top_level: top.into_comment(0, self.snippet.total_reply_count, None),
            replies,
        }
    }
}

/// Map an error response to the matching error, using the `reason` of the
/// first entry in `error.errors` when the API sends one.
pub(crate) fn classify_error(
    status: StatusCode,
    body: &str,
    video_id: Option<&str>,
    quota: &QuotaCounter,
) -> YouTubeApiError {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let reason = parsed
        .as_ref()
        .and_then(|v| v.pointer("/error/errors/0/reason"))
        .and_then(Value::as_str)
        .unwrap_or_default();
    let message = parsed
        .as_ref()
        .and_then(|v| v.pointer("/error/message"))
        .and_then(Value::as_str)
        .unwrap_or_default();
    let video = || video_id.unwrap_or_default().to_string();

    match (status.as_u16(), reason) {
        (_, "commentsDisabled") => YouTubeApiError::CommentsDisabled { video_id: video() },
        (_, "quotaExceeded") | (_, "dailyLimitExceeded") => YouTubeApiError::QuotaExceeded {
            used: quota.used(),
            limit: quota.limit(),
            requested: 0,
        },
        (_, "keyInvalid") | (401, _) => YouTubeApiError::InvalidApiKey,
        (_, "videoNotFound") | (404, _) => YouTubeApiError::VideoNotFound { video_id: video() },
        (429, _) | (_, "rateLimitExceeded") => YouTubeApiError::RateLimitExceeded,
        (403, _) => YouTubeApiError::Forbidden {
            reason: if reason.is_empty() {
                message.to_string()
            } else {
                reason.to_string()
            },
        },
        (code, _) if status.is_server_error() => YouTubeApiError::ServerError { status_code: code },
        (code, _) => YouTubeApiError::InvalidResponse {
            details: format!("status {}: {}", code, message),
        },
    }
}

#[derive(Debug)]
pub struct YouTubeApiClient {
    http_client: Client,
    api_key: String,
    base_url: String,
    quota: Arc<QuotaCounter>,
}

impl YouTubeApiClient {
    pub fn new(api_key: impl Into<String>, quota: Arc<QuotaCounter>) -> Result<Self, CoreError> {
        let http_client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            http_client,
            api_key: api_key.into(),
            base_url: YOUTUBE_API_BASE.to_string(),
            quota,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn quota(&self) -> &Arc<QuotaCounter> {
        &self.quota
    }

    /// Charge `cost` units, then GET `resource` with the API key attached.
    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        resource: &str,
        params: &[(&str, &str)],
        cost: u64,
        video_id: Option<&str>,
    ) -> Result<T, CoreError> {
        self.quota.charge(cost)?;

        let url = format!("{}/{}", self.base_url, resource);
        debug!("YouTube API request: {} {:?}", resource, params);
        let response = self
            .http_client
            .get(&url)
            .query(params)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| {
                error!("Network error for YouTube {}: {}", resource, e);
                if e.is_timeout() {
                    CoreError::YouTubeApi(YouTubeApiError::RequestTimeout)
                } else {
                    CoreError::Network(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = classify_error(status, &body, video_id, &self.quota);
            error!("YouTube {} failed with {}: {}", resource, status, err);
            return Err(err.into());
        }

        response.json::<T>().await.map_err(|e| {
            error!("Failed to parse YouTube {} response: {}", resource, e);
            CoreError::YouTubeApi(YouTubeApiError::InvalidResponse {
                details: format!("Failed to parse {} response", resource),
            })
        })
    }
}

#[async_trait]
impl VideoSource for YouTubeApiClient {
    async fn video(&self, video_id: &str) -> Result<YouTubeVideo, CoreError> {
        let response: ListResponse<VideoItem> = self
            .get_json(
                "videos",
                &[("part", "snippet,statistics"), ("id", video_id)],
                LIST_COST,
                Some(video_id),
            )
            .await?;

        let video = response
            .items
            .into_iter()
            .next()
            .map(VideoItem::into_video)
            .ok_or_else(|| YouTubeApiError::VideoNotFound {
                video_id: video_id.to_string(),
            })?;
        debug!("Retrieved video {} ({})", video.id, video.title);
        Ok(video)
    }

    async fn comment_threads(
        &self,
        video_id: &str,
        page_token: Option<&str>,
    ) -> Result<CommentThreadPage, CoreError> {
        let mut params = vec![
            ("part", "snippet,replies"),
            ("videoId", video_id),
            ("order", "relevance"),
            ("maxResults", COMMENT_PAGE_SIZE),
            ("textFormat", "plainText"),
        ];
        if let Some(token) = page_token {
            params.push(("pageToken", token));
        }

        let response: ListResponse<ThreadItem> = self
            .get_json("commentThreads", &params, LIST_COST, Some(video_id))
            .await?;

        Ok(CommentThreadPage {
            threads: response.items.into_iter().map(ThreadItem::into_thread).collect(),
            next_page_token: response.next_page_token.filter(|t| !t.is_empty()),
        })
    }

    async fn search(&self, query: &str, max_results: u32) -> Result<Vec<SearchHit>, CoreError> {
        let max_results = max_results.clamp(1, 50).to_string();
        let response: ListResponse<SearchItem> = self
            .get_json(
                "search",
                &[
                    ("part", "snippet"),
                    ("type", "video"),
                    ("order", "relevance"),
                    ("q", query),
                    ("maxResults", max_results.as_str()),
                ],
                SEARCH_COST,
                None,
            )
            .await?;

        let hits: Vec<SearchHit> = response
            .items
            .into_iter()
            .filter_map(|item| {
                Some(SearchHit {
                    video_id: item.id.video_id?,
                    published_at: parse_timestamp(item.snippet.published_at.as_deref()),
                    title: item.snippet.title,
                    channel_title: item.snippet.channel_title,
                })
            })
            .collect();
        info!("YouTube search {:?} returned {} videos", query, hits.len());
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quota::tests::ManualClock;
    use serde_json::json;

    fn counter(limit: u64) -> Arc<QuotaCounter> {
        Arc::new(QuotaCounter::with_clock(
            limit,
            Arc::new(ManualClock::at("2025-05-01T12:00:00Z")),
        ))
    }

    #[test]
    fn test_list_without_items_is_empty() {
        let videos: ListResponse<VideoItem> =
            serde_json::from_value(json!({ "kind": "youtube#videoListResponse" })).unwrap();
        assert!(videos.items.is_empty());
        assert!(videos.next_page_token.is_none());

        let threads: ListResponse<ThreadItem> =
            serde_json::from_value(json!({ "nextPageToken": "p2" })).unwrap();
        assert!(threads.items.is_empty());
        assert_eq!(threads.next_page_token.as_deref(), Some("p2"));

        let hits: ListResponse<SearchItem> =
            serde_json::from_value(json!({ "items": [] })).unwrap();
        assert!(hits.items.is_empty());
    }

    #[test]
    fn test_thread_conversion() {
        let raw = json!({
            "items": [{
                "snippet": {
                    "topLevelComment": {
                        "id": "top1",
                        "snippet": {
                            "authorDisplayName": "@viewer",
                            "textOriginal": "The bit at 3:12 explains lifetimes better than the book",
                            "textDisplay": "The bit at <a>3:12</a> explains",
                            "likeCount": 42,
                            "publishedAt": "2025-04-30T10:00:00Z"
                        }
                    },
                    "totalReplyCount": 7
                },
                "replies": {
                    "comments": [{
                        "id": "top1.r1",
                        "snippet": {
                            "authorDisplayName": "@other",
                            "textOriginal": "Agreed",
                            "likeCount": 3,
                            "parentId": "top1"
                        }
                    }]
                }
            }],
            "nextPageToken": "NEXT"
        });

        let response: ListResponse<ThreadItem> = serde_json::from_value(raw).unwrap();
        assert_eq!(response.next_page_token.as_deref(), Some("NEXT"));

        let thread = response.items.into_iter().next().unwrap().into_thread();
        assert_eq!(thread.top_level.score, 42);
        assert_eq!(thread.top_level.reply_count, 7);
        assert!(thread.top_level.body.starts_with("The bit at 3:12"));
        assert!(!thread.top_level.is_reply);
        assert!(thread.top_level.created_at.is_some());

        assert_eq!(thread.replies.len(), 1);
        assert!(thread.replies[0].is_reply);
        assert_eq!(thread.replies[0].depth, 1);
        assert_eq!(thread.replies[0].parent_id.as_deref(), Some("top1"));
    }

    #[test]
    fn test_video_conversion_parses_string_counts() {
        let raw = json!({
            "id": "dQw4w9WgXcQ",
            "snippet": {
                "title": "Rust in 100 seconds",
                "description": "",
                "channelId": "UC1",
                "channelTitle": "Channel",
                "publishedAt": "2024-01-01T00:00:00Z"
            },
            "statistics": { "viewCount": "1000", "likeCount": "50" }
        });
        let video = serde_json::from_value::<VideoItem>(raw).unwrap().into_video();
        assert_eq!(video.view_count, 1000);
        assert_eq!(video.like_count, 50);
        assert_eq!(video.comment_count, 0);
        assert_eq!(video.url, "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
    }

    #[test]
    fn test_classify_error() {
        let quota = counter(100);
        let body = |reason: &str| {
            json!({ "error": { "code": 403, "message": "nope", "errors": [{ "reason": reason }] } })
                .to_string()
        };

        assert!(matches!(
            classify_error(StatusCode::FORBIDDEN, &body("commentsDisabled"), Some("v1"), &quota),
            YouTubeApiError::CommentsDisabled { ref video_id } if video_id == "v1"
        ));
        assert!(matches!(
            classify_error(StatusCode::FORBIDDEN, &body("quotaExceeded"), None, &quota),
            YouTubeApiError::QuotaExceeded { limit: 100, .. }
        ));
        assert!(matches!(
            classify_error(StatusCode::BAD_REQUEST, &body("keyInvalid"), None, &quota),
            YouTubeApiError::InvalidApiKey
        ));
        assert!(matches!(
            classify_error(StatusCode::NOT_FOUND, "", Some("v1"), &quota),
            YouTubeApiError::VideoNotFound { .. }
        ));
        assert!(matches!(
            classify_error(StatusCode::SERVICE_UNAVAILABLE, "oops", None, &quota),
            YouTubeApiError::ServerError { status_code: 503 }
        ));
        assert!(matches!(
            classify_error(StatusCode::FORBIDDEN, &body("forbidden"), None, &quota),
            YouTubeApiError::Forbidden { ref reason } if reason == "forbidden"
        ));
    }

    #[tokio::test]
    async fn test_exhausted_quota_fails_before_request() {
        // Unroutable base URL: reaching the network would fail differently.
        let client = YouTubeApiClient::new("key", counter(99))
            .unwrap()
            .with_base_url("http://127.0.0.1:9");

        let err = client.search("rust", 10).await.unwrap_err();
        assert!(matches!(
            err,
            CoreError::YouTubeApi(YouTubeApiError::QuotaExceeded { used: 0, limit: 99, requested: 100 })
        ));
        assert_eq!(client.quota().used(), 0);
    }
}
