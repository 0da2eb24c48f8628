use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use threadsift_core::{CoreError, RawComment, RedditApiError, RedditPost};
use tracing::{debug, warn};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RedditPostData {
    pub id: String,
    pub title: String,
    pub selftext: String,
    pub author: String,
    pub subreddit: String,
    pub url: String,
    pub permalink: String,
    pub created_utc: f64,
    pub score: i64,
    pub num_comments: u64,
    pub upvote_ratio: Option<f64>,
    pub is_self: bool,
}

impl From<RedditPostData> for RedditPost {
    fn from(post_data: RedditPostData) -> Self {
        Self {
            id: post_data.id,
            title: post_data.title,
            content: if post_data.is_self && !post_data.selftext.is_empty() {
                Some(post_data.selftext)
            } else {
                None
            },
            author: post_data.author,
            subreddit: post_data.subreddit,
            url: post_data.url,
            permalink: if post_data.permalink.is_empty() {
                String::new()
            } else {
                format!("https://www.reddit.com{}", post_data.permalink)
            },
            score: post_data.score,
            num_comments: post_data.num_comments,
            upvote_ratio: post_data.upvote_ratio,
            created_utc: post_data.created_utc as i64,
        }
    }
}

/// A post and its comment tree flattened depth-first.
#[derive(Debug, Clone)]
pub struct RedditThread {
    pub post: RedditPost,
    pub comments: Vec<RawComment>,
}

/// Parse the two-listing array returned by `/comments/<id>`.
///
/// The post listing must be present. A missing or malformed comment
/// listing degrades to an empty comment set.
pub fn parse_thread(post_id: &str, body: &Value) -> Result<RedditThread, CoreError> {
    let post_data = body
        .get(0)
        .and_then(|listing| listing.pointer("/data/children/0/data"))
        .ok_or_else(|| {
            CoreError::RedditApi(RedditApiError::PostNotFound {
                post_id: post_id.to_string(),
            })
        })?;

    let post: RedditPostData = serde_json::from_value(post_data.clone()).map_err(|e| {
        CoreError::RedditApi(RedditApiError::InvalidResponse {
            details: format!("Failed to parse post {}: {}", post_id, e),
        })
    })?;

    let comments = match body
        .get(1)
        .and_then(|listing| listing.pointer("/data/children"))
        .and_then(Value::as_array)
    {
        Some(children) => flatten_comments(children),
        None => {
            warn!("Comment listing missing for post {}, continuing without comments", post_id);
            Vec::new()
        }
    };

    debug!("Parsed post {} with {} comments", post_id, comments.len());
    Ok(RedditThread {
        post: post.into(),
        comments,
    })
}

/// Depth-first flatten of a comment listing. `more` stubs are skipped.
pub fn flatten_comments(children: &[Value]) -> Vec<RawComment> {
    let mut out = Vec::new();
    walk(children, 0, &mut out);
    out
}

fn walk(children: &[Value], depth: u32, out: &mut Vec<RawComment>) {
    for child in children {
        if child.get("kind").and_then(Value::as_str) != Some("t1") {
            continue;
        }
        let Some(data) = child.get("data") else {
            continue;
        };

        // `replies` is an empty string when there are none.
        let replies = data
            .pointer("/replies/data/children")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        out.push(to_raw_comment(data, depth, count_comments(replies)));
        walk(replies, depth + 1, out);
    }
}

fn count_comments(children: &[Value]) -> u32 {
    children
        .iter()
        .filter(|child| child.get("kind").and_then(Value::as_str) == Some("t1"))
        .count() as u32
}

fn to_raw_comment(data: &Value, depth: u32, reply_count: u32) -> RawComment {
    let text = |key: &str| {
        data.get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };

    RawComment {
        id: text("id"),
        author: text("author"),
        body: text("body"),
        score: data.get("score").and_then(Value::as_i64).unwrap_or(0),
        created_at: data
            .get("created_utc")
            .and_then(Value::as_f64)
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs as i64, 0)),
        parent_id: data
            .get("parent_id")
            .and_then(Value::as_str)
            .map(str::to_string),
        depth,
        reply_count,
        award_count: data
            .get("total_awards_received")
            .and_then(Value::as_u64)
            .unwrap_or(0) as u32,
        is_reply: depth > 0,
    }
}
