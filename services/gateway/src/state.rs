use crate::config::RateLimitConfig;
use crate::rate_limit::RateLimiter;
use order_engine::{MemoryStore, OrderEngine};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<OrderEngine<MemoryStore>>,
    pub rate_limiter: Arc<RateLimiter>,
    /// HS256 key for bearer tokens
    pub jwt_secret: Arc<str>,
}

impl AppState {
    pub fn new(store: Arc<MemoryStore>, jwt_secret: &str, limits: RateLimitConfig) -> Self {
        Self {
            engine: Arc::new(OrderEngine::new(store)),
            rate_limiter: Arc::new(RateLimiter::new(limits)),
            jwt_secret: Arc::from(jwt_secret),
        }
    }
}
