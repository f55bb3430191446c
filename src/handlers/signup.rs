use crate::client_ip::request_key;
use crate::disposable_email::validate_not_disposable;
use crate::error::{AppError, Result};
use crate::middleware::enforce_limit;
use crate::models::SignupRequest;
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    response::Response,
};
use std::sync::Arc;

use super::proxy::{forward, read_body};

pub const SIGNUP_PATH: &str = "/api/auth/signup";

/// Account creation: the signup limiter counts every attempt, throwaway
/// inboxes are turned away, and what's left is handed to the app.
pub async fn signup_handler(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Response> {
    let key = request_key(&request);
    enforce_limit(&state.signup_limiter, "signup", &key)?;

    let (parts, body) = request.into_parts();
    let body = read_body(body, state.max_body_bytes).await?;

    let signup: SignupRequest = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("Invalid signup request: {}", e)))?;
    validate_not_disposable(&signup.email)?;

    tracing::info!(key = %key, "Forwarding signup");
    forward(&state, parts.method, &parts.uri, &parts.headers, body).await
}
