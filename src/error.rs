use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Rate limited: {reason}")]
    RateLimited {
        reason: String,
        limit: u32,
        reset_at: DateTime<Utc>,
        retry_after_secs: i64,
    },

    #[error("Invalid request origin")]
    InvalidOrigin,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Upstream error: {0}")]
    Upstream(#[from] reqwest::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Invalid limiter or gateway configuration, reported at startup.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be greater than 0")]
    Zero(&'static str),

    #[error("{0} is too large")]
    OutOfRange(&'static str),

    #[error("invalid URL for {name}: {value}")]
    InvalidUrl { name: &'static str, value: String },

    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reset_at: Option<DateTime<Utc>>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match self {
            AppError::RateLimited {
                reason,
                limit,
                reset_at,
                retry_after_secs,
            } => return rate_limited_response(reason, limit, reset_at, retry_after_secs),
            AppError::InvalidOrigin => (StatusCode::FORBIDDEN, "Invalid request origin", None),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized", None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "Not found", Some(msg)),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "Bad request", Some(msg)),
            AppError::Upstream(e) => {
                tracing::error!("Upstream error: {}", e);
                (StatusCode::BAD_GATEWAY, "Upstream unavailable", None)
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
            reset_at: None,
        };

        (status, Json(body)).into_response()
    }
}

// 429 with enough headers for a client to back off until `reset_at`
fn rate_limited_response(
    reason: String,
    limit: u32,
    reset_at: DateTime<Utc>,
    retry_after_secs: i64,
) -> Response {
    let retry_after = retry_after_secs.max(1);

    let body = ErrorResponse {
        error: reason,
        details: None,
        reset_at: Some(reset_at),
    };

    let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
    let headers = response.headers_mut();
    headers.insert(header::RETRY_AFTER, HeaderValue::from(retry_after));
    headers.insert("x-ratelimit-limit", HeaderValue::from(limit));
    headers.insert("x-ratelimit-remaining", HeaderValue::from(0u32));
    headers.insert("x-ratelimit-reset", HeaderValue::from(reset_at.timestamp()));
    response
}

pub type Result<T> = std::result::Result<T, AppError>;
