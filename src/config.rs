use crate::error::ConfigError;
use crate::rate_limit::RateLimitConfig;
use clap::Parser;
use url::Url;

// CLI argument structure, every flag can also come from the environment
#[derive(Parser, Debug, Clone)]
#[command(name = "starter-gateway")]
#[command(about = "Origin checks and rate limiting in front of the SaaS starter app")]
pub struct Args {
    // Port to run the gateway on
    #[arg(short, long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    // App the gateway forwards accepted requests to
    #[arg(short, long, env = "UPSTREAM_URL", default_value = "http://localhost:3000")]
    pub upstream_url: String,

    // Public URL of the app, trusted as a request origin
    #[arg(short, long, env = "APP_URL", default_value = "http://localhost:3000")]
    pub app_url: String,

    // Max requests per client under /api/ per window
    #[arg(long, env = "API_RATE_LIMIT", default_value_t = 50)]
    pub api_rate_limit: u32,

    // API rate limit window in seconds
    #[arg(long, env = "API_RATE_WINDOW", default_value_t = 60)]
    pub api_rate_window: u64,

    // Seconds between sweeps of idle API limiter entries
    #[arg(long, env = "API_CLEANUP_INTERVAL", default_value_t = 300)]
    pub api_cleanup_interval: u64,

    // Max signups per client per window
    #[arg(long, env = "SIGNUP_RATE_LIMIT", default_value_t = 3)]
    pub signup_rate_limit: u32,

    // Signup window in minutes
    #[arg(long, env = "SIGNUP_WINDOW", default_value_t = 15)]
    pub signup_window: u64,

    // Signup lockout in minutes once the limit is hit
    #[arg(long, env = "SIGNUP_BLOCK", default_value_t = 60)]
    pub signup_block: u64,

    // Minutes between sweeps of idle signup limiter entries
    #[arg(long, env = "SIGNUP_CLEANUP_INTERVAL", default_value_t = 120)]
    pub signup_cleanup_interval: u64,

    // Bearer token for /admin; the admin surface is off without it
    #[arg(long, env = "ADMIN_TOKEN")]
    pub admin_token: Option<String>,

    // Largest request body forwarded upstream
    #[arg(long, env = "MAX_BODY_BYTES", default_value_t = 1024 * 1024)]
    pub max_body_bytes: usize,
}

impl Args {
    /// Global `/api/` limiter: the block just waits out the window.
    pub fn api_rate_limit_config(&self) -> RateLimitConfig {
        let window_ms = self.api_rate_window.saturating_mul(1000);
        RateLimitConfig {
            max_attempts: self.api_rate_limit,
            window_duration_ms: window_ms,
            block_duration_ms: window_ms,
            cleanup_interval_ms: self.api_cleanup_interval.saturating_mul(1000),
            ..RateLimitConfig::global_api()
        }
    }

    pub fn signup_rate_limit_config(&self) -> RateLimitConfig {
        RateLimitConfig {
            max_attempts: self.signup_rate_limit,
            window_duration_ms: minutes_to_ms(self.signup_window),
            block_duration_ms: minutes_to_ms(self.signup_block),
            cleanup_interval_ms: minutes_to_ms(self.signup_cleanup_interval),
            ..RateLimitConfig::signup()
        }
    }

    /// Value for the `X-RateLimit-Policy` response header.
    pub fn rate_limit_policy(&self) -> String {
        if self.api_rate_window == 60 {
            format!("global:{}/min", self.api_rate_limit)
        } else {
            format!("global:{}/{}s", self.api_rate_limit, self.api_rate_window)
        }
    }

    /// Upstream base URL without a trailing slash, checked to be http(s).
    pub fn upstream_base(&self) -> Result<String, ConfigError> {
        let invalid = || ConfigError::InvalidUrl {
            name: "upstream_url",
            value: self.upstream_url.clone(),
        };
        let url = Url::parse(&self.upstream_url).map_err(|_| invalid())?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid());
        }
        Ok(self.upstream_url.trim_end_matches('/').to_string())
    }
}

fn minutes_to_ms(minutes: u64) -> u64 {
    minutes.saturating_mul(60_000)
}
