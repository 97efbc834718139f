use axum::http::HeaderMap;
use std::net::SocketAddr;

// Checked in order, first non-empty value wins.
// These are client-supplied and trusted as-is, so a caller can choose its own key.
pub const CLIENT_KEY_HEADERS: [&str; 3] = ["x-request-id", "x-real-ip", "x-forwarded-for"];

// Derive the rate limit key for a request.
// Falls back to the connection's "ip:port" when no header is set.
pub fn resolve_client_key(headers: &HeaderMap, remote_addr: Option<SocketAddr>) -> String {
    CLIENT_KEY_HEADERS
        .iter()
        .filter_map(|name| headers.get(*name))
        .find(|value| !value.is_empty())
        .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
        .or_else(|| remote_addr.map(|addr| addr.to_string()))
        .unwrap_or_default()
}
