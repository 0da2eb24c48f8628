//! YouTube source: Data API v3 client, daily quota accounting and comment
//! extraction.

pub mod api;
pub mod extractor;
pub mod quota;
pub mod video_url;

pub use api::{CommentThread, CommentThreadPage, SearchHit, VideoSource, YouTubeApiClient};
pub use extractor::YouTubeExtractor;
pub use quota::{QuotaCounter, DEFAULT_DAILY_LIMIT, LIST_COST, SEARCH_COST};
pub use video_url::{is_youtube_video_url, parse_video_id};
