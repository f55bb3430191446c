use crate::client_ip::request_key;
use crate::error::{AppError, Result};
use crate::metrics::{ORIGIN_REJECTED_TOTAL, RATE_LIMITED_TOTAL, REQUEST_TOTAL, TRACKED_KEYS};
use crate::rate_limit::{RateLimitResult, RateLimiter};
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    http::{HeaderValue, header},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

// Static assets and SEO files never go through the gates
const PASSTHROUGH_PATHS: [&str; 3] = ["/robots.txt", "/sitemap.xml", "/favicon.ico"];
const PASSTHROUGH_PREFIXES: [&str; 2] = ["/_next/static", "/_next/image"];
const IMAGE_EXTENSIONS: [&str; 6] = [".svg", ".png", ".jpg", ".jpeg", ".gif", ".webp"];

const API_PREFIX: &str = "/api/";

pub fn is_passthrough_path(path: &str) -> bool {
    if PASSTHROUGH_PATHS.contains(&path) || PASSTHROUGH_PREFIXES.iter().any(|p| path.starts_with(p)) {
        return true;
    }
    // Case-sensitive: `/logo.PNG` still goes through the gates
    IMAGE_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

/// Origin check first, then the global limiter for `/api/`. The first
/// failure short-circuits with 403 or 429.
pub async fn request_gate(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response> {
    REQUEST_TOTAL.inc();

    let path = request.uri().path().to_string();
    if is_passthrough_path(&path) {
        return Ok(next.run(request).await);
    }

    let headers = request.headers();
    let origin = headers.get(header::ORIGIN).and_then(|v| v.to_str().ok());
    let referer = headers.get(header::REFERER).and_then(|v| v.to_str().ok());
    if !state
        .origin_guard
        .permits(request.method(), &path, origin, referer)
    {
        ORIGIN_REJECTED_TOTAL.inc();
        tracing::warn!(
            method = %request.method(),
            path = %path,
            origin = origin.unwrap_or("-"),
            referer = referer.unwrap_or("-"),
            "Rejected request origin"
        );
        return Err(AppError::InvalidOrigin);
    }

    if !path.starts_with(API_PREFIX) {
        return Ok(next.run(request).await);
    }

    let key = request_key(&request);
    let limit = enforce_limit(&state.api_limiter, "api", &key)?;

    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert("x-ratelimit-limit", HeaderValue::from(state.api_limiter.config().max_attempts));
    headers.insert("x-ratelimit-remaining", HeaderValue::from(limit.remaining));
    Ok(response)
}

/// Runs one check against `limiter` and turns a denial into a 429.
pub fn enforce_limit(limiter: &RateLimiter, name: &'static str, key: &str) -> Result<RateLimitResult> {
    let result = limiter.check(key);
    TRACKED_KEYS
        .with_label_values(&[name])
        .set(limiter.tracked_keys() as f64);

    if result.allowed {
        return Ok(result);
    }

    RATE_LIMITED_TOTAL.with_label_values(&[name]).inc();
    tracing::warn!(limiter = name, key, reset_at = %result.reset_at, "Rate limit exceeded");

    // Round up so a client that waits Retry-After is never early
    let wait_ms = (result.reset_at - limiter.now()).num_milliseconds();
    Err(AppError::RateLimited {
        reason: result.reason.unwrap_or_else(|| limiter.config().reason.clone()),
        limit: limiter.config().max_attempts,
        reset_at: result.reset_at,
        retry_after_secs: wait_ms.saturating_add(999).div_euclid(1000),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passthrough_covers_seo_and_static_assets() {
        assert!(is_passthrough_path("/robots.txt"));
        assert!(is_passthrough_path("/sitemap.xml"));
        assert!(is_passthrough_path("/favicon.ico"));
        assert!(is_passthrough_path("/_next/static/chunks/main.js"));
        assert!(is_passthrough_path("/_next/image"));
        assert!(is_passthrough_path("/images/hero.png"));
        assert!(!is_passthrough_path("/images/Hero.PNG"));
        assert!(!is_passthrough_path("/api/export.PNG"));
        assert!(!is_passthrough_path("/api/stripe/manage-subscription"));
        assert!(!is_passthrough_path("/signup"));
    }
}
