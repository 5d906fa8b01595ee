//! Hub core: the coordinator actor and the outbound queues it feeds.

pub mod coordinator;
pub mod outbound;

pub use coordinator::{Coordinator, CoordinatorHandle, HubEvent, HubStats, Publication};
pub use outbound::{
    EnqueueOutcome, OutboundReceiver, OutboundSender, OverflowPolicy, Payload, outbound_queue,
};
