//! Producer side of a connection's outbound queue.
//!
//! The coordinator holds an [`OutboundSender`] per live connection and only
//! ever enqueues onto it. The matching [`OutboundReceiver`] is drained by
//! that connection's pump task, which is the single writer to the socket.

use std::fmt;
use std::str::FromStr;

use axum::extract::ws::Utf8Bytes;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// An encoded reply or event, ready to be written as one text frame.
///
/// Cheap to clone, so fan-out shares one buffer across recipients.
pub type Payload = Utf8Bytes;

/// Consumer half of an outbound queue, owned by the pump.
pub type OutboundReceiver = mpsc::Receiver<Payload>;

/// What to do when a connection's outbound queue is full.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OverflowPolicy {
    /// Discard the message being enqueued. The coordinator never waits on
    /// a slow client.
    #[default]
    DropNewest,
    /// Wait for room in the queue. A slow client then stalls the
    /// coordinator loop for everyone until its pump catches up.
    Block,
}

impl FromStr for OverflowPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "drop_newest" | "drop-newest" | "drop" => Ok(Self::DropNewest),
            "block" => Ok(Self::Block),
            other => Err(format!("unknown overflow policy: {other}")),
        }
    }
}

impl fmt::Display for OverflowPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DropNewest => f.write_str("drop_newest"),
            Self::Block => f.write_str("block"),
        }
    }
}

/// Result of a single enqueue attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// The payload is in the queue.
    Queued,
    /// The queue was full and the payload was discarded.
    DroppedFull,
    /// The pump has exited; nothing will ever drain this queue again.
    Closed,
}

/// Producer handle onto one connection's bounded outbound queue.
#[derive(Debug, Clone)]
pub struct OutboundSender {
    tx: mpsc::Sender<Payload>,
    policy: OverflowPolicy,
}

/// Creates a bounded outbound queue with the given overflow policy.
#[must_use]
pub fn outbound_queue(capacity: usize, policy: OverflowPolicy) -> (OutboundSender, OutboundReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (OutboundSender { tx, policy }, rx)
}

impl OutboundSender {
    /// Enqueues a payload according to the overflow policy.
    pub async fn enqueue(&self, payload: Payload) -> EnqueueOutcome {
        match self.policy {
            OverflowPolicy::DropNewest => match self.tx.try_send(payload) {
                Ok(()) => EnqueueOutcome::Queued,
                Err(TrySendError::Full(_)) => EnqueueOutcome::DroppedFull,
                Err(TrySendError::Closed(_)) => EnqueueOutcome::Closed,
            },
            OverflowPolicy::Block => match self.tx.send(payload).await {
                Ok(()) => EnqueueOutcome::Queued,
                Err(_) => EnqueueOutcome::Closed,
            },
        }
    }
}
