use crate::clock::{Clock, SystemClock};
use crate::config::Args;
use crate::error::ConfigError;
use crate::origin_guard::OriginGuard;
use crate::rate_limit::RateLimiter;
use std::sync::Arc;

// app's shared state

pub struct AppState {
    pub client: reqwest::Client,
    pub upstream_url: String,        // no trailing slash
    pub origin_guard: OriginGuard,
    pub api_limiter: RateLimiter,    // everything under /api/
    pub signup_limiter: RateLimiter, // account creation only
    pub admin_token: Option<String>,
    pub max_body_bytes: usize,
    pub rate_limit_policy: String,   // advertised in X-RateLimit-Policy
}

impl AppState {
    pub fn from_args(args: &Args) -> Result<Self, ConfigError> {
        Self::with_clock(args, Arc::new(SystemClock))
    }

    /// Both limiters read time from `clock`.
    pub fn with_clock(args: &Args, clock: Arc<dyn Clock>) -> Result<Self, ConfigError> {
        Ok(Self {
            // Direct hop to the app; redirects go back to the browser untouched
            client: reqwest::Client::builder()
                .no_proxy()
                .redirect(reqwest::redirect::Policy::none())
                .build()
                .map_err(|e| ConfigError::HttpClient(e.to_string()))?,
            upstream_url: args.upstream_base()?,
            origin_guard: OriginGuard::new(&args.app_url),
            api_limiter: RateLimiter::with_clock(args.api_rate_limit_config(), clock.clone())?,
            signup_limiter: RateLimiter::with_clock(args.signup_rate_limit_config(), clock)?,
            admin_token: args.admin_token.clone().filter(|t| !t.is_empty()),
            max_body_bytes: args.max_body_bytes,
            rate_limit_policy: args.rate_limit_policy(),
        })
    }

    /// Looks up a limiter by the name used on the admin surface.
    pub fn limiter(&self, name: &str) -> Option<&RateLimiter> {
        match name {
            "api" => Some(&self.api_limiter),
            "signup" => Some(&self.signup_limiter),
            _ => None,
        }
    }
}
