use std::sync::Arc;
use crate::rate_limit::RateLimiter;
// app's shared state

#[derive(Clone)]
pub struct AppState {
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppState {
    pub fn new(rate_limiter: Arc<RateLimiter>) -> Self {
        Self { rate_limiter }
    }
}
