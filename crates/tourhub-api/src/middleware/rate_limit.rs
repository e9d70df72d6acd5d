//! Token bucket rate limiter middleware.
//!
//! Buckets live in a bounded `moka` cache, so idle callers are evicted and
//! the number of tracked callers never grows past `max_keys`.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use moka::future::Cache;
use tracing::debug;

use tourhub_core::AppError;
use tourhub_core::config::RateLimitConfig;
use tourhub_core::types::UserId;

use crate::error::ApiError;
use crate::extractors::auth::USER_ID_HEADER;
use crate::state::AppState;

#[derive(Debug)]
struct TokenBucket {
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    fn full(max_tokens: u32, now: Instant) -> Self {
        Self {
            tokens: f64::from(max_tokens),
            last_refill: now,
        }
    }

    fn try_take(&mut self, max_tokens: u32, refill_rate: f64, now: Instant) -> bool {
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * refill_rate).min(f64::from(max_tokens));
        self.last_refill = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

/// Per-key token bucket rate limiter.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    buckets: Cache<String, Arc<Mutex<TokenBucket>>>,
    enabled: bool,
    max_tokens: u32,
    refill_rate: f64,
}

impl RateLimiter {
    /// Create a limiter from configuration.
    pub fn new(config: &RateLimitConfig) -> Self {
        let buckets = Cache::builder()
            .max_capacity(config.max_keys)
            .time_to_idle(Duration::from_secs(config.idle_ttl_seconds.max(1)))
            .build();
        Self {
            buckets,
            enabled: config.enabled,
            max_tokens: config.max_tokens,
            refill_rate: config.refill_per_second.max(0.0),
        }
    }

    /// Try to consume a token for `key`.
    pub async fn check(&self, key: &str) -> bool {
        if !self.enabled {
            return true;
        }
        let now = Instant::now();
        let max_tokens = self.max_tokens;
        let bucket = self
            .buckets
            .get_with(key.to_string(), async move {
                Arc::new(Mutex::new(TokenBucket::full(max_tokens, now)))
            })
            .await;

        let mut bucket = bucket.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        bucket.try_take(self.max_tokens, self.refill_rate, now)
    }
}

/// Bucket key for a request.
///
/// Only a caller id that parses gets its own bucket. Anything else shares
/// the client address bucket.
fn bucket_key(request: &Request) -> String {
    request
        .headers()
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|raw| raw.trim().parse::<UserId>().ok())
        .map(|id| format!("user:{id}"))
        .or_else(|| {
            request
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| format!("addr:{}", addr.ip()))
        })
        .unwrap_or_else(|| "anonymous".to_string())
}

/// Rate-limit by caller id, falling back to the client address.
pub async fn rate_limit(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let key = bucket_key(&request);

    if !state.rate_limiter.check(&key).await {
        debug!(key = %key, "Rate limit exceeded");
        return ApiError(AppError::rate_limited("Too many requests")).into_response();
    }

    next.run(request).await
}
