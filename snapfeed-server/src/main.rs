use anyhow::Context;
use snapfeed_server::{api, config::Settings, seed, state::AppState};
use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How often expired sessions are swept
const SESSION_CLEANUP_INTERVAL_SECS: u64 = 3600;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "snapfeed_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::new().context("Failed to load settings")?;

    let state = AppState::from_settings(&settings)?;

    if settings.storage.seed_sample_data {
        if seed::seed_sample_data(state.store.as_ref())? {
            tracing::info!("Sample data seeded successfully");
        }
    } else {
        tracing::info!("Sample data seeding disabled");
    }

    // Start background task for periodic session cleanup
    let cleanup_state = state.clone();
    tokio::spawn(async move {
        let mut interval =
            tokio::time::interval(tokio::time::Duration::from_secs(SESSION_CLEANUP_INTERVAL_SECS));
        loop {
            interval.tick().await;
            tracing::debug!("Running periodic session cleanup...");
            if let Err(e) = cleanup_state.session_manager.cleanup_expired_sessions() {
                tracing::error!("Periodic session cleanup failed: {}", e);
            }
        }
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = api::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port)
        .parse()
        .context("Failed to parse server address")?;
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
