//! Server assembly: spawns the hub tasks and builds the router.
//!
//! Shared by the binary and the integration tests so both run exactly the
//! same wiring.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tokio::task::JoinHandle;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api;
use crate::app_state::AppState;
use crate::config::GatewayConfig;
use crate::domain::Catalog;
use crate::hub::{Coordinator, CoordinatorHandle};
use crate::service::Publisher;
use crate::ws::handler::ws_handler;

/// Running hub tasks plus the state handed to the router.
#[derive(Debug)]
pub struct RunningHub {
    /// State for [`build_app`].
    pub state: AppState,
    /// The coordinator event loop.
    pub coordinator_task: JoinHandle<()>,
    /// The publisher timer loop.
    pub publisher_task: JoinHandle<()>,
}

/// Spawns the coordinator and publisher for one server instance.
///
/// Must be called from within a Tokio runtime.
#[must_use]
pub fn start_hub(config: &GatewayConfig) -> RunningHub {
    let (coordinator, handle) = Coordinator::new(config.coordinator_queue_capacity);
    let coordinator_task = tokio::spawn(coordinator.run());

    let publisher = Publisher::new(handle.clone(), config.publish_interval);
    let channels: Arc<[_]> = publisher.channels().into();
    let publisher_task = tokio::spawn(publisher.run());

    let state = AppState {
        coordinator: handle,
        catalog: Arc::new(Catalog::seed()),
        channels,
        outbound_capacity: config.outbound_queue_capacity,
        overflow_policy: config.overflow_policy,
    };

    RunningHub {
        state,
        coordinator_task,
        publisher_task,
    }
}

/// Builds the full router: REST endpoints plus the WebSocket upgrade route.
///
/// Serve it with `into_make_service_with_connect_info::<SocketAddr>()`;
/// the upgrade handler reads the peer address.
pub fn build_app(state: AppState, ws_path: &str) -> Router {
    Router::new()
        .merge(api::build_router())
        .route(ws_path, get(ws_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// Resolves on Ctrl-C (or SIGTERM on Unix), then asks the coordinator to
/// close every connection's outbound queue.
pub async fn shutdown_signal(coordinator: CoordinatorHandle) {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("shutdown signal received");
    if coordinator.shutdown().await.is_err() {
        tracing::debug!("coordinator already stopped");
    }
}
