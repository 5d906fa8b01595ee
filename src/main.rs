//! pokedex-gateway server entry point.
//!
//! Starts the hub tasks and the Axum HTTP server with REST and WebSocket
//! endpoints.

use std::net::SocketAddr;

use tracing_subscriber::EnvFilter;

use pokedex_gateway::config::GatewayConfig;
use pokedex_gateway::server::{build_app, shutdown_signal, start_hub};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = GatewayConfig::from_env()?;
    tracing::info!(
        addr = %config.listen_addr,
        ws_path = %config.ws_path,
        overflow_policy = %config.overflow_policy,
        "starting pokedex-gateway"
    );

    // Spawn coordinator and publisher
    let hub = start_hub(&config);
    let coordinator = hub.state.coordinator.clone();

    // Build router
    let app = build_app(hub.state, &config.ws_path);

    // Binding is the only fatal failure after startup
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(coordinator))
    .await?;

    let _ = hub.coordinator_task.await;
    hub.publisher_task.abort();
    tracing::info!("pokedex-gateway stopped");

    Ok(())
}
