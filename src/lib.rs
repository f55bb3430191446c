pub mod client_ip;
pub mod clock;
pub mod config;
pub mod disposable_email;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod origin_guard;
pub mod rate_limit;
pub mod state;

pub use handlers::router;
