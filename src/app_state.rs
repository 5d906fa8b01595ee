//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::domain::{Catalog, ChannelName};
use crate::hub::{CoordinatorHandle, OverflowPolicy};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Front door to the coordinator loop.
    pub coordinator: CoordinatorHandle,
    /// Read-only query data.
    pub catalog: Arc<Catalog>,
    /// Channels the publisher feeds, advertised in the welcome message.
    pub channels: Arc<[ChannelName]>,
    /// Capacity of each new connection's outbound queue.
    pub outbound_capacity: usize,
    /// Full-queue policy for each new connection.
    pub overflow_policy: OverflowPolicy,
}
