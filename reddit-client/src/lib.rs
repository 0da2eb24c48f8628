//! Reddit source: app-only OAuth, thread fetching and comment extraction.

pub mod api;
pub mod auth;
pub mod comments;
pub mod extractor;
pub mod post_url;
pub mod rate_limiter;

pub use api::{RedditApiClient, ThreadFetcher};
pub use auth::{Clock, ClientCredentials, FetchedToken, SystemClock, TokenCache, TokenSource};
pub use comments::{flatten_comments, parse_thread, RedditThread};
pub use extractor::RedditExtractor;
pub use post_url::{is_reddit_post_url, parse_post_id};
pub use rate_limiter::{RateLimitConfig, RateLimiter};
