use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Reddit,
    YouTube,
}

/// A comment as fetched from upstream, before any quality filtering.
///
/// YouTube comments map onto the same shape: the comment text goes in
/// `body`, likes in `score` and the thread's reply total in `reply_count`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawComment {
    pub id: String,
    pub author: String,
    pub body: String,
    pub score: i64,
    pub created_at: Option<DateTime<Utc>>,
    pub parent_id: Option<String>,
    pub depth: u32,
    pub reply_count: u32,
    pub award_count: u32,
    pub is_reply: bool,
}

impl RawComment {
    /// Length of the comment text in characters.
    pub fn body_len(&self) -> usize {
        self.body.chars().count()
    }
}

/// Comments that survived a quality filter. Same shape, different promise.
pub type ValuableComment = RawComment;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionStats {
    pub total: usize,
    pub valid: usize,
    pub extracted: usize,
    pub percentage_kept: u32,
    pub average_score: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedditPost {
    pub id: String,
    pub title: String,
    pub content: Option<String>,
    pub author: String,
    pub subreddit: String,
    pub url: String,
    pub permalink: String,
    pub score: i64,
    pub num_comments: u64,
    pub upvote_ratio: Option<f64>,
    pub created_utc: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YouTubeVideo {
    pub id: String,
    pub title: String,
    pub description: String,
    pub channel_id: String,
    pub channel_title: String,
    pub url: String,
    pub published_at: Option<DateTime<Utc>>,
    pub view_count: u64,
    pub like_count: u64,
    pub comment_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "lowercase")]
pub enum ContentMetadata {
    Reddit(RedditPost),
    #[serde(rename = "youtube")]
    YouTube(YouTubeVideo),
}

impl ContentMetadata {
    pub fn source(&self) -> Source {
        match self {
            ContentMetadata::Reddit(_) => Source::Reddit,
            ContentMetadata::YouTube(_) => Source::YouTube,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            ContentMetadata::Reddit(post) => &post.title,
            ContentMetadata::YouTube(video) => &video.title,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    pub metadata: ContentMetadata,
    pub valuable_comments: Vec<ValuableComment>,
    pub extraction_stats: ExtractionStats,
}

/// Outcome of one model call, or of a whole fallback chain.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelCallResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,
}

impl ModelCallResult {
    pub fn success(model: impl Into<String>, analysis: impl Into<String>) -> Self {
        Self {
            success: true,
            analysis: Some(analysis.into()),
            model: Some(model.into()),
            error: None,
            code: None,
        }
    }

    pub fn failure(model: impl Into<String>, error: impl Into<String>, code: Option<u16>) -> Self {
        Self {
            success: false,
            analysis: None,
            model: Some(model.into()),
            error: Some(error.into()),
            code,
        }
    }

    /// Overloaded (503) or out of quota (429).
    pub fn is_capacity_failure(&self) -> bool {
        !self.success && matches!(self.code, Some(503) | Some(429))
    }
}
