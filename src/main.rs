//! arena-hub server entry point.
//!
//! Starts the conductor and the Axum HTTP server with the player
//! WebSocket route.

use tracing_subscriber::EnvFilter;

use arena_hub::api;
use arena_hub::app_state::AppState;
use arena_hub::config::HubConfig;
use arena_hub::service::Hub;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = HubConfig::from_env()?;
    let listen_addr = config.listen_addr;
    tracing::info!(
        addr = %listen_addr,
        route = %config.route_path,
        policy = ?config.overflow_policy,
        "starting arena-hub"
    );

    // Start the hub and its conductor
    let hub = Hub::spawn(config);

    // Build router
    let app = api::build_router(AppState { hub });

    // Start server
    let listener = tokio::net::TcpListener::bind(listen_addr).await?;
    tracing::info!(addr = %listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
