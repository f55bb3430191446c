use crate::rate_limit::UNKNOWN_KEY;
use axum::extract::{ConnectInfo, Request};
use axum::http::HeaderMap;
use std::net::SocketAddr;

/// [`client_key`] for an incoming request, using the socket peer when the
/// server was started with connect info.
pub fn request_key(request: &Request) -> String {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    client_key(request.headers(), peer)
}

/// Picks the rate limit key for a request.
///
/// Forwarding headers are taken at face value: they are only as honest as
/// the reverse proxy in front of the gateway. Order is fixed so the same
/// request always maps to the same key: `X-Forwarded-For` (first hop),
/// `CF-Connecting-IP`, `X-Real-IP`, then the socket peer.
pub fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let forwarded = header_str(headers, "x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    forwarded
        .or_else(|| header_str(headers, "cf-connecting-ip"))
        .or_else(|| header_str(headers, "x-real-ip"))
        .map(str::to_string)
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| UNKNOWN_KEY.to_string())
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}
