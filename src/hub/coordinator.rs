//! Connection registry and channel fan-out coordinator.
//!
//! [`Coordinator`] is the single owner of the live-connection set and of
//! every connection's [`SubscriptionSet`]. All mutations arrive as
//! messages through a [`CoordinatorHandle`] and are applied one at a time
//! inside [`Coordinator::run`], so the state needs no locks and every
//! fan-out decision sees all previously processed subscription changes.
//!
//! Two inboxes feed the loop: connection events (register, deregister,
//! subscribe, unsubscribe, unicast, stats, shutdown) and publications.
//! `tokio::select!` polls them in random order, so neither source starves
//! the other; each inbox is FIFO.
//!
//! The coordinator never touches sockets. Delivery means enqueueing onto
//! the recipient's [`OutboundSender`].

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use utoipa::ToSchema;

use super::outbound::{EnqueueOutcome, OutboundSender, Payload};
use crate::domain::{ChannelName, ConnectionId, SubscriptionSet};
use crate::error::GatewayError;

/// Events submitted by connections and the HTTP layer.
#[derive(Debug)]
pub enum HubEvent {
    /// Admit a connection to the live set with an empty subscription set.
    Register {
        /// Connection identity.
        conn_id: ConnectionId,
        /// Producer side of the connection's outbound queue.
        outbound: OutboundSender,
    },
    /// Remove a connection and discard its subscriptions. Idempotent.
    Deregister {
        /// Connection identity.
        conn_id: ConnectionId,
    },
    /// Add a channel to a connection's subscription set.
    Subscribe {
        /// Connection identity.
        conn_id: ConnectionId,
        /// Channel to add.
        channel: ChannelName,
    },
    /// Remove a channel from a connection's subscription set.
    Unsubscribe {
        /// Connection identity.
        conn_id: ConnectionId,
        /// Channel to remove.
        channel: ChannelName,
    },
    /// Enqueue a reply for exactly one connection.
    Unicast {
        /// Connection identity.
        conn_id: ConnectionId,
        /// Encoded reply.
        payload: Payload,
    },
    /// Report registry counters.
    Stats {
        /// Where to send the snapshot.
        reply: oneshot::Sender<HubStats>,
    },
    /// Drop every connection's outbound queue and stop the loop.
    Shutdown,
}

/// A channel event submitted for fan-out.
#[derive(Debug, Clone)]
pub struct Publication {
    /// Target channel.
    pub channel: ChannelName,
    /// Encoded event, shared by all recipients.
    pub payload: Payload,
}

/// Point-in-time registry counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct HubStats {
    /// Live connections.
    pub connections: usize,
    /// Sum of all connections' subscription counts.
    pub subscriptions: usize,
    /// Distinct channels with at least one subscriber.
    pub channels: usize,
}

#[derive(Debug)]
struct ConnectionEntry {
    outbound: OutboundSender,
    subscriptions: SubscriptionSet,
}

/// The single-owner actor holding all shared hub state.
///
/// Constructed per server instance with [`Coordinator::new`]; there is no
/// process-wide registry.
#[derive(Debug)]
pub struct Coordinator {
    connections: HashMap<ConnectionId, ConnectionEntry>,
    events: mpsc::Receiver<HubEvent>,
    publications: mpsc::Receiver<Publication>,
}

impl Coordinator {
    /// Creates a coordinator and the handle used to feed it.
    ///
    /// `capacity` bounds each of the two inboxes.
    #[must_use]
    pub fn new(capacity: usize) -> (Self, CoordinatorHandle) {
        let (events_tx, events) = mpsc::channel(capacity.max(1));
        let (publications_tx, publications) = mpsc::channel(capacity.max(1));
        let coordinator = Self {
            connections: HashMap::new(),
            events,
            publications,
        };
        let handle = CoordinatorHandle {
            events: events_tx,
            publications: publications_tx,
        };
        (coordinator, handle)
    }

    /// Runs the event loop until a shutdown event arrives or every handle
    /// has been dropped.
    pub async fn run(mut self) {
        tracing::info!("coordinator started");
        loop {
            let running = tokio::select! {
                Some(event) = self.events.recv() => self.handle_event(event).await,
                Some(publication) = self.publications.recv() => {
                    self.publish(publication).await;
                    true
                }
                else => false,
            };
            if !running {
                break;
            }
        }
        tracing::info!(remaining = self.connections.len(), "coordinator stopped");
    }

    /// Applies one connection event. Returns `false` when the loop should stop.
    async fn handle_event(&mut self, event: HubEvent) -> bool {
        match event {
            HubEvent::Register { conn_id, outbound } => self.register(conn_id, outbound),
            HubEvent::Deregister { conn_id } => self.deregister(conn_id),
            HubEvent::Subscribe { conn_id, channel } => self.subscribe(conn_id, channel),
            HubEvent::Unsubscribe { conn_id, channel } => self.unsubscribe(conn_id, &channel),
            HubEvent::Unicast { conn_id, payload } => self.unicast(conn_id, payload).await,
            HubEvent::Stats { reply } => {
                let _ = reply.send(self.stats());
            }
            HubEvent::Shutdown => {
                tracing::info!(
                    connections = self.connections.len(),
                    "coordinator shutting down, closing outbound queues"
                );
                self.connections.clear();
                return false;
            }
        }
        true
    }

    fn register(&mut self, conn_id: ConnectionId, outbound: OutboundSender) {
        let entry = ConnectionEntry {
            outbound,
            subscriptions: SubscriptionSet::new(),
        };
        if self.connections.insert(conn_id, entry).is_some() {
            tracing::warn!(%conn_id, "connection registered twice, previous entry replaced");
        }
        tracing::info!(%conn_id, live = self.connections.len(), "connection registered");
    }

    fn deregister(&mut self, conn_id: ConnectionId) {
        match self.connections.remove(&conn_id) {
            Some(entry) => tracing::info!(
                %conn_id,
                subscriptions = entry.subscriptions.count(),
                live = self.connections.len(),
                "connection deregistered"
            ),
            None => tracing::debug!(%conn_id, "deregister for unknown connection ignored"),
        }
    }

    fn subscribe(&mut self, conn_id: ConnectionId, channel: ChannelName) {
        let Some(entry) = self.connections.get_mut(&conn_id) else {
            tracing::debug!(%conn_id, %channel, "subscribe from unregistered connection dropped");
            return;
        };
        let added = entry.subscriptions.subscribe(channel.clone());
        tracing::debug!(%conn_id, %channel, added, "subscribed");
    }

    fn unsubscribe(&mut self, conn_id: ConnectionId, channel: &ChannelName) {
        let Some(entry) = self.connections.get_mut(&conn_id) else {
            tracing::debug!(%conn_id, %channel, "unsubscribe from unregistered connection dropped");
            return;
        };
        let removed = entry.subscriptions.unsubscribe(channel.as_str());
        tracing::debug!(%conn_id, %channel, removed, "unsubscribed");
    }

    async fn unicast(&self, conn_id: ConnectionId, payload: Payload) {
        let Some(entry) = self.connections.get(&conn_id) else {
            tracing::debug!(%conn_id, "reply for unregistered connection dropped");
            return;
        };
        log_outcome(conn_id, entry.outbound.enqueue(payload).await);
    }

    async fn publish(&self, publication: Publication) {
        let Publication { channel, payload } = publication;
        let mut recipients = 0_usize;
        for (conn_id, entry) in &self.connections {
            if !entry.subscriptions.matches(channel.as_str()) {
                continue;
            }
            let outcome = entry.outbound.enqueue(payload.clone()).await;
            if outcome == EnqueueOutcome::Queued {
                recipients += 1;
            }
            log_outcome(*conn_id, outcome);
        }
        tracing::trace!(%channel, recipients, "publication fanned out");
    }

    fn stats(&self) -> HubStats {
        let mut channels: HashSet<&ChannelName> = HashSet::new();
        let mut subscriptions = 0;
        for entry in self.connections.values() {
            subscriptions += entry.subscriptions.count();
            channels.extend(entry.subscriptions.iter());
        }
        HubStats {
            connections: self.connections.len(),
            subscriptions,
            channels: channels.len(),
        }
    }
}

fn log_outcome(conn_id: ConnectionId, outcome: EnqueueOutcome) {
    match outcome {
        EnqueueOutcome::Queued => {}
        EnqueueOutcome::DroppedFull => {
            tracing::warn!(%conn_id, "outbound queue full, message dropped");
        }
        // The pump has exited and its deregister event is already on the way.
        EnqueueOutcome::Closed => {
            tracing::debug!(%conn_id, "outbound queue closed, message dropped");
        }
    }
}

/// Cloneable front door to a running [`Coordinator`].
///
/// Every method only submits a message. All methods fail with
/// [`GatewayError::CoordinatorUnavailable`] once the loop has stopped.
#[derive(Debug, Clone)]
pub struct CoordinatorHandle {
    events: mpsc::Sender<HubEvent>,
    publications: mpsc::Sender<Publication>,
}

impl CoordinatorHandle {
    async fn submit(&self, event: HubEvent) -> Result<(), GatewayError> {
        self.events
            .send(event)
            .await
            .map_err(|_| GatewayError::CoordinatorUnavailable)
    }

    /// Admits a connection to the live set.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::CoordinatorUnavailable`] if the loop has stopped.
    pub async fn register(
        &self,
        conn_id: ConnectionId,
        outbound: OutboundSender,
    ) -> Result<(), GatewayError> {
        self.submit(HubEvent::Register { conn_id, outbound }).await
    }

    /// Removes a connection from the live set. Safe to call more than once.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::CoordinatorUnavailable`] if the loop has stopped.
    pub async fn deregister(&self, conn_id: ConnectionId) -> Result<(), GatewayError> {
        self.submit(HubEvent::Deregister { conn_id }).await
    }

    /// Subscribes a connection to a channel.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::CoordinatorUnavailable`] if the loop has stopped.
    pub async fn subscribe(
        &self,
        conn_id: ConnectionId,
        channel: ChannelName,
    ) -> Result<(), GatewayError> {
        self.submit(HubEvent::Subscribe { conn_id, channel }).await
    }

    /// Unsubscribes a connection from a channel.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::CoordinatorUnavailable`] if the loop has stopped.
    pub async fn unsubscribe(
        &self,
        conn_id: ConnectionId,
        channel: ChannelName,
    ) -> Result<(), GatewayError> {
        self.submit(HubEvent::Unsubscribe { conn_id, channel }).await
    }

    /// Sends a reply to exactly one connection.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::CoordinatorUnavailable`] if the loop has stopped.
    pub async fn unicast(&self, conn_id: ConnectionId, payload: Payload) -> Result<(), GatewayError> {
        self.submit(HubEvent::Unicast { conn_id, payload }).await
    }

    /// Fans a payload out to every current subscriber of `channel`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::CoordinatorUnavailable`] if the loop has stopped.
    pub async fn publish(&self, channel: ChannelName, payload: Payload) -> Result<(), GatewayError> {
        self.publications
            .send(Publication { channel, payload })
            .await
            .map_err(|_| GatewayError::CoordinatorUnavailable)
    }

    /// Returns registry counters as seen by the loop.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::CoordinatorUnavailable`] if the loop has stopped.
    pub async fn stats(&self) -> Result<HubStats, GatewayError> {
        let (reply, rx) = oneshot::channel();
        self.submit(HubEvent::Stats { reply }).await?;
        rx.await.map_err(|_| GatewayError::CoordinatorUnavailable)
    }

    /// Asks the loop to close every outbound queue and stop.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::CoordinatorUnavailable`] if the loop has
    /// already stopped.
    pub async fn shutdown(&self) -> Result<(), GatewayError> {
        self.submit(HubEvent::Shutdown).await
    }
}
