use crate::config::RateLimitConfig;
use crate::error::AppError;
use dashmap::DashMap;
use std::time::Instant;

#[derive(Clone)]
struct Bucket {
    capacity: u32,
    tokens: f64,
    refill_rate: f64,
    last_update: Instant,
}

impl Bucket {
    fn new(capacity: u32, refill_rate: f64) -> Self {
        Self {
            capacity,
            tokens: capacity as f64,
            refill_rate,
            last_update: Instant::now(),
        }
    }

    fn allow_request(&mut self, tokens: u32) -> bool {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_update).as_secs_f64();

        // Refill tokens
        self.tokens = f64::min(
            self.capacity as f64,
            self.tokens + elapsed * self.refill_rate,
        );
        self.last_update = now;

        if self.tokens >= tokens as f64 {
            self.tokens -= tokens as f64;
            true
        } else {
            false
        }
    }
}

/// Token buckets keyed by `customer:endpoint`
pub struct RateLimiter {
    buckets: DashMap<String, Bucket>,
    limits: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(limits: RateLimitConfig) -> Self {
        Self {
            buckets: DashMap::new(),
            limits,
        }
    }

    pub fn check_rate_limit(&self, key: &str) -> Result<(), AppError> {
        let mut bucket = self
            .buckets
            .entry(key.to_string())
            .or_insert_with(|| Bucket::new(self.limits.capacity, self.limits.refill_per_sec));

        if bucket.allow_request(1) {
            Ok(())
        } else {
            tracing::warn!(key, "Rate limit exceeded");
            Err(AppError::RateLimitExceeded(format!("Rate limit for {}", key)))
        }
    }
}
