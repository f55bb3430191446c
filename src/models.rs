use crate::rate_limit::RateLimitStats;
use serde::{Deserialize, Serialize};

// Only the field the gateway inspects; the full body is forwarded untouched
#[derive(Deserialize, Debug)]
pub struct SignupRequest {
    pub email: String,
}

// GET /admin/rate-limits
#[derive(Serialize, Debug)]
pub struct RateLimitOverview {
    pub api: RateLimitStats,
    pub signup: RateLimitStats,
}
