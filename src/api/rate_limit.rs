//! Request throttling shared by all clients
//!
//! One token bucket covers the whole server, sized from `LANWAKE_RATE_LIMIT`
//! (`server.rate_limit_per_minute` in the config file). Rejected requests get
//! a `429` with the usual error body.

use std::num::NonZeroU32;
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use governor::{Quota, RateLimiter, clock::DefaultClock, state::InMemoryState, state::NotKeyed};

use super::{ApiError, ApiState};

/// Server-wide token bucket
pub type SharedLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Bucket allowing `requests` per minute, with that many as the burst
///
/// `0` is treated as one request per minute; callers that want no limit
/// leave [`ApiState::rate_limiter`] unset instead.
#[must_use]
pub fn per_minute(requests: u32) -> SharedLimiter {
    let quota = Quota::per_minute(NonZeroU32::new(requests).unwrap_or(NonZeroU32::MIN));
    Arc::new(RateLimiter::direct(quota))
}

/// Reject the request once the bucket is empty
pub async fn throttle(
    State(state): State<Arc<ApiState>>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(limiter) = &state.rate_limiter else {
        return Ok(next.run(req).await);
    };

    if limiter.check().is_err() {
        tracing::warn!(method = %req.method(), uri = %req.uri(), "request throttled");
        return Err(ApiError::RateLimited);
    }

    Ok(next.run(req).await)
}
