use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use std::sync::{Mutex, PoisonError};
use std::time::Instant;
use tracing::debug;

use crate::AppState;

/// Global token bucket.
///
/// Not keyed by client: every request to the gateway draws from the same
/// bucket, which caps how many runs the service can start against the remote
/// API per second.
#[derive(Debug)]
pub struct SimpleRateLimiter {
    // (last_update, tokens)
    state: Mutex<(Instant, f32)>,
    rate_per_sec: f32,
    burst_size: f32,
}

impl SimpleRateLimiter {
    pub fn new(rate_per_sec: f32, burst_size: f32) -> Self {
        Self {
            state: Mutex::new((Instant::now(), burst_size)),
            rate_per_sec,
            burst_size,
        }
    }

    pub fn check(&self) -> bool {
        let mut guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let (last_update, tokens) = *guard;
        let now = Instant::now();
        let elapsed = now.duration_since(last_update).as_secs_f32();

        let available = (tokens + elapsed * self.rate_per_sec).min(self.burst_size);

        if available >= 1.0 {
            *guard = (now, available - 1.0);
            true
        } else {
            // Record the refill even when denying.
            *guard = (now, available);
            false
        }
    }
}

/// Middleware to enforce rate limits
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    if state.config.resilience.rate_limit_enabled && !state.rate_limiter.check() {
        debug!(name: "http.rate_limited", path = %req.uri().path(), "Request rate limited");
        return Err(StatusCode::TOO_MANY_REQUESTS);
    }
    Ok(next.run(req).await)
}
