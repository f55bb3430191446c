use crate::error::{AppError, Result};
use crate::metrics::TRACKED_KEYS;
use crate::models::RateLimitOverview;
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use std::sync::Arc;

// GET /admin/rate-limits
pub async fn rate_limit_stats(State(state): State<Arc<AppState>>) -> Json<RateLimitOverview> {
    Json(RateLimitOverview {
        api: state.api_limiter.stats(),
        signup: state.signup_limiter.stats(),
    })
}

// DELETE /admin/rate-limits/{limiter}/{key}
pub async fn reset_rate_limit(
    State(state): State<Arc<AppState>>,
    Path((name, key)): Path<(String, String)>,
) -> Result<StatusCode> {
    let limiter = state
        .limiter(&name)
        .ok_or_else(|| AppError::NotFound(format!("Unknown rate limiter: {}", name)))?;

    limiter.reset(&key);
    TRACKED_KEYS
        .with_label_values(&[name.as_str()])
        .set(limiter.tracked_keys() as f64);
    tracing::info!(limiter = %name, key = %key, "Rate limit reset by operator");

    Ok(StatusCode::NO_CONTENT)
}
