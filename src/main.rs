use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bugtrail_sidecar::api::{routes::create_router, state::AppState};
use bugtrail_sidecar::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Load environment
    dotenvy::dotenv().ok();

    let config = Config::from_env();
    let addr = format!("{}:{}", config.host, config.port);

    // Create application state
    let state = AppState::new(config).await?;

    // Build router
    let app = create_router(state.clone());

    // Start server
    tracing::info!("Bugtrail sidecar starting on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received");
        })
        .await?;

    // Stop the pipeline and drain pending history/settings writes.
    state.pipeline.shutdown();
    state.flush.flush().await;

    Ok(())
}
