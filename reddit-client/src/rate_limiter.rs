use std::sync::Arc;
use std::time::Duration;
use threadsift_core::CoreError;
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};
use tokio::time::{sleep, Instant};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub time_window: Duration,
    pub burst_allowance: u32,
}

impl RateLimitConfig {
    /// Reddit's published OAuth allowance is 100 requests per minute.
    pub fn reddit_oauth() -> Self {
        Self {
            max_requests: 100,
            time_window: Duration::from_secs(60),
            burst_allowance: 10,
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self::reddit_oauth()
    }
}

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

#[derive(Debug)]
pub struct TokenBucket {
    state: Mutex<Bucket>,
    capacity: f64,
    refill_rate: f64,
}

impl TokenBucket {
    pub fn new(config: &RateLimitConfig) -> Self {
        let capacity = config.burst_allowance.max(1) as f64;
        Self {
            state: Mutex::new(Bucket {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
            capacity,
            refill_rate: config.max_requests.max(1) as f64 / config.time_window.as_secs_f64(),
        }
    }

    /// Takes one token, or reports how long until one is available.
    pub async fn try_take(&self) -> Result<(), Duration> {
        let mut bucket = self.state.lock().await;
        let now = Instant::now();
        let elapsed = now.duration_since(bucket.last_refill).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * self.refill_rate).min(self.capacity);
        bucket.last_refill = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            Ok(())
        } else {
            Err(Duration::from_secs_f64(
                (1.0 - bucket.tokens) / self.refill_rate,
            ))
        }
    }

    pub async fn available(&self) -> f64 {
        let bucket = self.state.lock().await;
        let elapsed = Instant::now().duration_since(bucket.last_refill).as_secs_f64();
        (bucket.tokens + elapsed * self.refill_rate).min(self.capacity)
    }
}

/// Caps in-flight requests at the burst size and paces them to the
/// configured rate.
#[derive(Debug)]
pub struct RateLimiter {
    bucket: TokenBucket,
    in_flight: Arc<Semaphore>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            bucket: TokenBucket::new(&config),
            in_flight: Arc::new(Semaphore::new(config.burst_allowance.max(1) as usize)),
        }
    }

    /// Hold the returned permit for the duration of the request.
    pub async fn acquire_permit(&self) -> Result<OwnedSemaphorePermit, CoreError> {
        let permit = self
            .in_flight
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| CoreError::Internal {
                message: format!("rate limiter closed: {}", e),
            })?;

        while let Err(wait) = self.bucket.try_take().await {
            debug!("Reddit rate limit reached, waiting {:?}", wait);
            sleep(wait).await;
        }
        Ok(permit)
    }

    pub async fn available_tokens(&self) -> u32 {
        self.bucket.available().await.floor() as u32
    }
}
