use std::{net::SocketAddr, num::NonZeroU32, time::Duration};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use governor::{Quota, RateLimiter, clock::DefaultClock, state::keyed::DashMapStateStore};
use tour_core::AppError;
use tracing::warn;

use crate::{AppState, application::errors::ApiError};

const UNKNOWN_CLIENT: &str = "unknown";

type KeyedLimiter = RateLimiter<String, DashMapStateStore<String>, DefaultClock>;

/// Per-client request budget: `max` requests, refilled evenly over `window`.
pub struct RequestLimiter {
    limiter: KeyedLimiter,
}

impl RequestLimiter {
    pub fn new(max: NonZeroU32, window: Duration) -> Self {
        // A window shorter than one nanosecond per request rounds to zero.
        let quota = Quota::with_period(window / max.get())
            .unwrap_or_else(|| Quota::per_second(max))
            .allow_burst(max);
        Self {
            limiter: RateLimiter::dashmap(quota),
        }
    }

    /// Counts one request against `client`, returning whether it may proceed.
    pub fn check(&self, client: &str) -> bool {
        self.limiter.check_key(&client.to_string()).is_ok()
    }
}

/// Client address as reported by a proxy, else the peer address.
fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    if let Some(forwarded) = headers.get("x-forwarded-for")
        && let Ok(value) = forwarded.to_str()
        && let Some(first) = value.split(',').next().map(str::trim)
        && !first.is_empty()
    {
        return first.to_string();
    }

    if let Some(real_ip) = headers.get("x-real-ip")
        && let Ok(value) = real_ip.to_str()
        && !value.trim().is_empty()
    {
        return value.trim().to_string();
    }

    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

/// Middleware rejecting clients that exhausted their request budget.
pub async fn limit_requests(
    State(app_state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let client = client_key(req.headers(), peer);

    if !app_state.limiter.check(&client) {
        warn!("Rate limit exceeded for client {}", client);
        return Err(AppError::new(
            "Too many requests from this IP, please try again later.",
            StatusCode::TOO_MANY_REQUESTS,
        )
        .into());
    }
    Ok(next.run(req).await)
}
