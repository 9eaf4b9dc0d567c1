use crate::web::api::AppState;
use crate::web::error::ApiError;
use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::net::{IpAddr, SocketAddr};

/// Best-effort client address: the socket peer if known, else the first `x-forwarded-for` hop.
fn client_ip(req: &Request) -> IpAddr {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip())
        .or_else(|| {
            req.headers()
                .get("x-forwarded-for")
                .and_then(|h| h.to_str().ok())
                .and_then(|s| s.split(',').next())
                .and_then(|s| s.trim().parse().ok())
        })
        .unwrap_or(IpAddr::from([127, 0, 0, 1]))
}

/// Middleware for rate limiting login attempts per IP.
pub async fn login_rate_limit_middleware(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let ip = client_ip(&req);
    if !state.rate_limiter.check_and_increment(ip).await {
        tracing::warn!(%ip, "Login rate limit exceeded");
        return ApiError::TooManyRequests.into_response();
    }
    next.run(req).await
}
