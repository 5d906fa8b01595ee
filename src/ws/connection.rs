//! Per-connection lifecycle.
//!
//! Wires one upgraded WebSocket into the hub: registers it with the
//! coordinator, starts its outbound pump, and runs its inbound reader
//! until either side fails.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::ws::WebSocket;
use futures_util::StreamExt;
use tokio::sync::watch;

use super::messages::{ReplyBody, WsReply, encode_reply};
use super::pump::run_pump;
use super::reader::{ReaderContext, run_reader};
use crate::app_state::AppState;
use crate::domain::ConnectionId;
use crate::hub::{CoordinatorHandle, outbound_queue};

/// Deregisters a connection at most once.
///
/// Shared by the reader and the pump; whichever detects failure first
/// submits the deregister event, the other's attempt is a no-op. The other
/// side can also wait on [`Departure::departed`] to stop on its own.
#[derive(Debug, Clone)]
pub struct Departure {
    conn_id: ConnectionId,
    coordinator: CoordinatorHandle,
    departed: Arc<watch::Sender<bool>>,
}

impl Departure {
    /// Creates the guard for a freshly registered connection.
    #[must_use]
    pub fn new(conn_id: ConnectionId, coordinator: CoordinatorHandle) -> Self {
        Self {
            conn_id,
            coordinator,
            departed: Arc::new(watch::Sender::new(false)),
        }
    }

    /// Identity of the guarded connection.
    #[must_use]
    pub const fn conn_id(&self) -> ConnectionId {
        self.conn_id
    }

    /// Submits the deregister event unless it was already submitted.
    ///
    /// Returns `true` if this call was the one that departed.
    pub async fn depart(&self) -> bool {
        if self.departed.send_replace(true) {
            return false;
        }
        if self.coordinator.deregister(self.conn_id).await.is_err() {
            tracing::debug!(conn_id = %self.conn_id, "coordinator gone before deregister");
        }
        true
    }

    /// Returns `true` once the deregister event has been submitted.
    #[must_use]
    pub fn has_departed(&self) -> bool {
        *self.departed.borrow()
    }

    /// Resolves once either side has departed.
    pub async fn departed(&self) {
        let mut rx = self.departed.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = rx.wait_for(|departed| *departed).await;
    }
}

/// Runs a single WebSocket connection to completion.
pub async fn run_connection(socket: WebSocket, peer: SocketAddr, state: AppState) {
    let conn_id = ConnectionId::new();
    let (ws_tx, ws_rx) = socket.split();
    let (outbound, queue) = outbound_queue(state.outbound_capacity, state.overflow_policy);

    if state.coordinator.register(conn_id, outbound).await.is_err() {
        tracing::warn!(%conn_id, %peer, "hub is shutting down, refusing connection");
        return;
    }
    tracing::info!(%conn_id, %peer, "ws connection established");

    let departure = Departure::new(conn_id, state.coordinator.clone());
    let welcome = WsReply::new(String::new(), ReplyBody::welcome(state.channels.to_vec()));
    match encode_reply(&welcome) {
        Ok(payload) => {
            if state.coordinator.unicast(conn_id, payload).await.is_err() {
                tracing::debug!(%conn_id, "coordinator gone before welcome");
            }
        }
        Err(err) => tracing::warn!(%conn_id, error = %err, "failed to encode welcome"),
    }

    let pump = tokio::spawn(run_pump(ws_tx, queue, departure.clone()));

    let ctx = ReaderContext {
        departure,
        coordinator: state.coordinator,
        catalog: state.catalog,
    };
    run_reader(ws_rx, ctx).await;

    if let Err(err) = pump.await {
        tracing::warn!(%conn_id, error = %err, "outbound pump task failed");
    }
    tracing::info!(%conn_id, %peer, "ws connection closed");
}
