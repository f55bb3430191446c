mod admin;
mod health;
mod metrics;
mod proxy;
mod signup;

pub use admin::{rate_limit_stats, reset_rate_limit};
pub use health::health_handler;
pub use metrics::metrics_handler;
pub use proxy::proxy_handler;
pub use signup::{SIGNUP_PATH, signup_handler};

use crate::middleware::{request_gate, require_admin};
use crate::state::AppState;
use axum::{
    Router,
    http::{HeaderName, HeaderValue, header},
    middleware::from_fn_with_state,
    routing::{delete, get, post},
};
use std::sync::Arc;
use tower_http::{set_header::SetResponseHeaderLayer, trace::TraceLayer};

const CONTENT_SECURITY_POLICY: &str = "default-src 'self'; \
    script-src 'self' 'unsafe-inline' 'unsafe-eval' https://js.stripe.com https://app.posthog.com; \
    style-src 'self' 'unsafe-inline'; font-src 'self' data:; img-src 'self' data: blob: https:; \
    connect-src 'self' https://*.supabase.co https://api.stripe.com https://app.posthog.com;";

/// Full gateway: origin guard and API limiter in front of every route,
/// security headers on every response.
pub fn router(state: Arc<AppState>) -> Router {
    let admin = Router::new()
        .route("/admin/rate-limits", get(rate_limit_stats))
        .route("/admin/rate-limits/{limiter}/{key}", delete(reset_rate_limit))
        .route_layer(from_fn_with_state(state.clone(), require_admin));

    let policy = HeaderValue::from_str(&state.rate_limit_policy).ok();

    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route(SIGNUP_PATH, post(signup_handler))
        .merge(admin)
        .fallback(proxy_handler)
        .layer(from_fn_with_state(state.clone(), request_gate))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CONTENT_SECURITY_POLICY,
            HeaderValue::from_static(CONTENT_SECURITY_POLICY),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-ratelimit-policy"),
            policy,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
