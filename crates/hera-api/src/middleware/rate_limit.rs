//! # Per-Organization Rate Limiting
//!
//! Fixed-window limiter keyed by organization. A caller bound to an
//! organization is always counted against it; otherwise the
//! `x-organization-id` header is used when it holds a valid UUID. Everything
//! else shares the `anonymous` bucket.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use hera_core::OrganizationId;
use parking_lot::Mutex;

use crate::auth::CallerIdentity;
use crate::error::AppError;

/// Header carrying the organization a request acts on.
pub const ORGANIZATION_HEADER: &str = "x-organization-id";

const ANONYMOUS: &str = "anonymous";

/// Rate limiter configuration.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Maximum requests per window.
    pub max_requests: u64,
    /// Window duration in seconds.
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 600,
            window_secs: 60,
        }
    }
}

#[derive(Debug, Clone)]
struct BucketState {
    count: u64,
    window_start: Instant,
}

/// Shared rate limiter state.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    config: RateLimitConfig,
    buckets: Arc<Mutex<HashMap<String, BucketState>>>,
}

impl RateLimiter {
    /// Create a new rate limiter with the given config.
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            buckets: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Count a request against `key`; `false` once the window is exhausted.
    pub fn check(&self, key: &str) -> bool {
        self.check_at(key, Instant::now())
    }

    fn check_at(&self, key: &str, now: Instant) -> bool {
        let window = Duration::from_secs(self.config.window_secs);
        let mut buckets = self.buckets.lock();

        if !buckets.contains_key(key) {
            buckets.retain(|_, b| now.saturating_duration_since(b.window_start) < window);
        }

        let bucket = buckets.entry(key.to_string()).or_insert(BucketState {
            count: 0,
            window_start: now,
        });

        if now.saturating_duration_since(bucket.window_start) >= window {
            bucket.count = 0;
            bucket.window_start = now;
        }

        if bucket.count >= self.config.max_requests {
            false
        } else {
            bucket.count += 1;
            true
        }
    }

    /// Number of tracked buckets.
    pub fn bucket_count(&self) -> usize {
        self.buckets.lock().len()
    }
}

/// Bucket key for a request: the caller's bound organization, else a valid
/// `x-organization-id` header in canonical form, else `anonymous`.
pub fn rate_limit_key(request: &Request) -> String {
    if let Some(org) = request
        .extensions()
        .get::<CallerIdentity>()
        .and_then(|c| c.organization_id.as_ref())
    {
        return org.to_string();
    }
    request
        .headers()
        .get(ORGANIZATION_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| OrganizationId::parse(v).ok())
        .map_or_else(|| ANONYMOUS.to_string(), |org| org.to_string())
}

/// Middleware enforcing the per-organization limit.
pub async fn rate_limit_middleware(request: Request, next: Next) -> Response {
    let limiter = request.extensions().get::<RateLimiter>().cloned();

    if let Some(limiter) = limiter {
        let key = rate_limit_key(&request);

        if !limiter.check(&key) {
            tracing::warn!(organization = %key, "rate limit exceeded");
            return AppError::RateLimited(format!("rate limit exceeded for {key}")).into_response();
        }
    }

    next.run(request).await
}
