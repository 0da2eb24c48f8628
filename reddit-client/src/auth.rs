//! Application-only OAuth for the Reddit API.
//!
//! [`TokenCache`] hands out a bearer token and refreshes it shortly before
//! it expires. The credential exchange itself sits behind [`TokenSource`]
//! so the cache can be driven with a fake source and a fake clock.

use async_trait::async_trait;
use oauth2::basic::BasicClient;
use oauth2::{
    AuthType, AuthUrl, ClientId, ClientSecret, HttpRequest, HttpResponse, TokenResponse, TokenUrl,
};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use threadsift_core::{CoreError, RedditApiError};
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

const AUTH_URL: &str = "https://www.reddit.com/api/v1/authorize";
const TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";
const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(3600);
pub const DEFAULT_SAFETY_MARGIN: Duration = Duration::from_secs(60);

pub trait Clock: Send + Sync {
    fn now(&self) -> SystemTime;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// A freshly exchanged token and its lifetime.
#[derive(Debug, Clone)]
pub struct FetchedToken {
    pub access_token: String,
    pub expires_in: Duration,
}

#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn fetch_token(&self) -> Result<FetchedToken, CoreError>;
}

#[derive(Clone)]
struct CachedToken {
    value: String,
    expires_at: SystemTime,
}

pub struct TokenCache {
    source: Arc<dyn TokenSource>,
    clock: Arc<dyn Clock>,
    safety_margin: Duration,
    cached: RwLock<Option<CachedToken>>,
    refresh_count: AtomicU64,
}

impl fmt::Debug for TokenCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCache")
            .field("safety_margin", &self.safety_margin)
            .field("refresh_count", &self.refresh_count.load(Ordering::Relaxed))
            .finish()
    }
}

impl TokenCache {
    pub fn new(source: Arc<dyn TokenSource>) -> Self {
        Self::with_clock(source, Arc::new(SystemClock))
    }

    pub fn with_clock(source: Arc<dyn TokenSource>, clock: Arc<dyn Clock>) -> Self {
        Self {
            source,
            clock,
            safety_margin: DEFAULT_SAFETY_MARGIN,
            cached: RwLock::new(None),
            refresh_count: AtomicU64::new(0),
        }
    }

    pub fn with_safety_margin(mut self, margin: Duration) -> Self {
        self.safety_margin = margin;
        self
    }

    /// Cached token if still fresh, otherwise a new one from the source.
    ///
    /// Concurrent callers that all see a stale token each refresh; the last
    /// write wins and every written value is a complete token.
    pub async fn get_token(&self) -> Result<String, CoreError> {
        {
            let cached = self.cached.read().await;
            if let Some(token) = cached.as_ref() {
                if self.clock.now() < token.expires_at {
                    return Ok(token.value.clone());
                }
                debug!("Cached Reddit token expired, refreshing");
            }
        }

        let fetched = self.source.fetch_token().await.map_err(|e| {
            error!("Reddit token exchange failed: {}", e);
            match e {
                CoreError::RedditApi(RedditApiError::AuthenticationFailed { .. }) => e,
                other => CoreError::RedditApi(RedditApiError::AuthenticationFailed {
                    reason: other.to_string(),
                }),
            }
        })?;

        if fetched.access_token.is_empty() {
            return Err(CoreError::RedditApi(RedditApiError::AuthenticationFailed {
                reason: "token endpoint returned no access token".to_string(),
            }));
        }

        let ttl = fetched.expires_in.saturating_sub(self.safety_margin);
        let token = CachedToken {
            value: fetched.access_token,
            expires_at: self.clock.now() + ttl,
        };
        let value = token.value.clone();
        *self.cached.write().await = Some(token);
        let refreshes = self.refresh_count.fetch_add(1, Ordering::Relaxed) + 1;
        info!("Obtained Reddit access token (refresh #{}), valid for {:?}", refreshes, ttl);

        Ok(value)
    }

    /// Drop the cached token. Called after the API rejects it with a 401.
    pub async fn invalidate(&self) {
        warn!("Invalidating cached Reddit token");
        *self.cached.write().await = None;
    }

    /// Forget the token and the refresh counter.
    pub async fn reset(&self) {
        *self.cached.write().await = None;
        self.refresh_count.store(0, Ordering::Relaxed);
    }

    pub fn refresh_count(&self) -> u64 {
        self.refresh_count.load(Ordering::Relaxed)
    }
}

/// Client-credentials exchange against Reddit's token endpoint.
pub struct ClientCredentials {
    oauth_client: BasicClient,
    http_client: reqwest::Client,
}

impl ClientCredentials {
    pub fn new(
        client_id: String,
        client_secret: String,
        user_agent: &str,
    ) -> Result<Self, CoreError> {
        let auth_url = AuthUrl::new(AUTH_URL.to_string()).map_err(|e| CoreError::Internal {
            message: format!("Invalid auth URL: {}", e),
        })?;
        let token_url = TokenUrl::new(TOKEN_URL.to_string()).map_err(|e| CoreError::Internal {
            message: format!("Invalid token URL: {}", e),
        })?;

        let oauth_client = BasicClient::new(
            ClientId::new(client_id),
            Some(ClientSecret::new(client_secret)),
            auth_url,
            Some(token_url),
        )
        .set_auth_type(AuthType::BasicAuth);

        // Reddit rejects token requests without a descriptive User-Agent.
        let http_client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            oauth_client,
            http_client,
        })
    }
}

#[async_trait]
impl TokenSource for ClientCredentials {
    async fn fetch_token(&self) -> Result<FetchedToken, CoreError> {
        let http_client = self.http_client.clone();
        let response = self
            .oauth_client
            .exchange_client_credentials()
            .request_async(|request| send_token_request(http_client, request))
            .await
            .map_err(|e| {
                CoreError::RedditApi(RedditApiError::AuthenticationFailed {
                    reason: e.to_string(),
                })
            })?;

        Ok(FetchedToken {
            access_token: response.access_token().secret().clone(),
            expires_in: response.expires_in().unwrap_or(DEFAULT_TOKEN_TTL),
        })
    }
}

async fn send_token_request(
    http_client: reqwest::Client,
    request: HttpRequest,
) -> Result<HttpResponse, reqwest::Error> {
    let response = http_client
        .request(request.method, request.url.as_str())
        .headers(request.headers)
        .body(request.body)
        .send()
        .await?;

    let status_code = response.status();
    let headers = response.headers().clone();
    let body = response.bytes().await?.to_vec();

    Ok(HttpResponse {
        status_code,
        headers,
        body,
    })
}
