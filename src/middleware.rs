use axum::{
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::net::SocketAddr;
use tracing::debug;

use crate::client_key::resolve_client_key;
use crate::metrics::REQUEST_TOTAL;
use crate::state::AppState;

pub const RATE_LIMIT_MESSAGE: &str = "🚫 Rate limit exceeded! Please wait and try again. ⏳\n";

// Gate each request on the caller's quota before it reaches the handler
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    REQUEST_TOTAL.inc();

    let remote_addr = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let client_key = resolve_client_key(req.headers(), remote_addr);

    if !state.rate_limiter.check(&client_key) {
        debug!(client = %client_key, "Rate limit exceeded");
        return (StatusCode::TOO_MANY_REQUESTS, RATE_LIMIT_MESSAGE).into_response();
    }

    next.run(req).await
}
