use site_gate::{
    AppState,
    config::{AppConfig, Env},
    create_router,
    directory::{Directory, DirectoryState},
    resolver::{ResolverState, StaticSiteResolver},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Loads configuration, logging and the user/group directory, then serves the
/// gated site.
#[tokio::main]
async fn main() {
    // 1. Configuration & Environment Loading
    // Loads .env file settings before configuration can be read.
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    // 2. Logging Filter Setup
    // RUST_LOG wins, otherwise gate debug output plus request summaries.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "site_gate=debug,tower_http=info".into());

    // 3. Initialize Logging based on Environment
    match config.env {
        Env::Local => {
            // LOCAL: pretty output for reading in a terminal.
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            // PROD: one JSON object per line for log collectors.
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("site-gate starting in {:?} mode", config.env);

    // 4. Secret Check
    // A missing AUTH_SECRET is not refused, but it is logged at every start.
    if config.uses_fallback_secret() {
        match config.env {
            Env::Production => tracing::error!(
                "AUTH_SECRET is not set; session tokens are signed with the public fallback secret"
            ),
            Env::Local => tracing::warn!("AUTH_SECRET is not set; using the fallback secret"),
        }
    }

    // 5. Directory Loading (Fail-Fast)
    // Users and groups are read once; the gate cannot run without them.
    let directory = Directory::load(&config.users_file, &config.groups_file)
        .unwrap_or_else(|e| panic!("FATAL: failed to load user directory: {e}"));
    // Wrapped in an Arc for sharing across requests without locking.
    let directory = Arc::new(directory) as DirectoryState;

    // 6. Downstream Content
    // Static files under SITE_ROOT, served for public and authorized requests.
    let resolver = Arc::new(StaticSiteResolver::new(&config.site_root)) as ResolverState;

    // 7. Unified State Assembly and Server Startup
    let bind_addr = config.bind_addr.clone();
    let site_root = config.site_root.clone();
    let app = create_router(AppState {
        directory,
        resolver,
        config,
    });

    // Binds the TCP listener and runs the server until it stops.
    let listener = TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("FATAL: failed to bind {bind_addr}: {e}"));

    tracing::info!(%bind_addr, %site_root, "listening");

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "server stopped");
    }
}
