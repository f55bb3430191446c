use clap::Parser; // for cli
use starter_gateway::config::Args;
use starter_gateway::router;
use starter_gateway::state::AppState;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "starter_gateway=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // parse cli arguments
    let args = Args::parse();

    let state = match AppState::from_args(&args) {
        Ok(state) => Arc::new(state),
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let app = router(state.clone());

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    tracing::info!("Gateway running on http://localhost:{}", args.port);
    tracing::info!("Forwarding to {}", state.upstream_url);
    tracing::info!("Trusted origins: {:?}", state.origin_guard.allowed_origins());
    tracing::info!(
        "API rate limit: {} requests per {} seconds",
        args.api_rate_limit, args.api_rate_window
    );
    tracing::info!(
        "Signup rate limit: {} per {} minutes, {} minute lockout",
        args.signup_rate_limit, args.signup_window, args.signup_block
    );
    if state.admin_token.is_none() {
        tracing::info!("ADMIN_TOKEN not set, admin endpoints disabled");
    }

    if let Err(e) = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
