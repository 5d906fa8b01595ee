//! Outbound pump: the single writer for one connection's socket.
//!
//! Drains the connection's outbound queue in FIFO order and writes each
//! payload as a text frame. No other task holds the write half, so writes
//! never interleave.

use std::fmt;

use axum::extract::ws::Message;
use futures_util::{Sink, SinkExt};

use super::connection::Departure;
use crate::hub::OutboundReceiver;

/// Runs the pump until the queue closes or a write fails.
///
/// - Queue closed: the coordinator dropped this connection (deregister or
///   shutdown). The socket is closed and nothing else happens.
/// - Write failed: the socket is closed and the connection departs, which
///   submits its single deregister event.
pub async fn run_pump<S>(mut sink: S, mut queue: OutboundReceiver, departure: Departure)
where
    S: Sink<Message> + Unpin,
    S::Error: fmt::Display,
{
    let conn_id = departure.conn_id();
    let mut written = 0_u64;

    loop {
        let Some(payload) = queue.recv().await else {
            break;
        };
        if let Err(err) = sink.send(Message::Text(payload)).await {
            tracing::warn!(%conn_id, error = %err, "ws write failed");
            // Release the queue first so a coordinator blocked on it can move on.
            drop(queue);
            let _ = sink.close().await;
            departure.depart().await;
            return;
        }
        written += 1;
    }

    let _ = sink.close().await;
    tracing::debug!(%conn_id, written, "outbound pump finished");
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::ConnectionId;
    use crate::hub::{Coordinator, HubStats, OverflowPolicy, outbound_queue};
    use futures_util::sink;
    use tokio::sync::mpsc;

    /// A sink that forwards every frame into a channel.
    fn recording_sink(
        tx: mpsc::UnboundedSender<Message>,
    ) -> impl Sink<Message, Error = String> + Unpin {
        Box::pin(sink::unfold(tx, |tx, msg: Message| async move {
            tx.send(msg).map_err(|e| e.to_string())?;
            Ok::<_, String>(tx)
        }))
    }

    /// A sink whose every write fails.
    fn broken_sink() -> impl Sink<Message, Error = String> + Unpin {
        Box::pin(sink::unfold((), |(), _msg: Message| async move {
            Err::<(), _>("connection reset".to_string())
        }))
    }

    #[tokio::test]
    async fn writes_in_enqueue_order_then_stops_when_queue_closes() {
        let (coordinator, handle) = Coordinator::new(8);
        drop(coordinator);
        let departure = Departure::new(ConnectionId::new(), handle);
        let (outbound, queue) = outbound_queue(8, OverflowPolicy::DropNewest);
        let (frames_tx, mut frames_rx) = mpsc::unbounded_channel();

        for text in ["one", "two", "three"] {
            let _ = outbound.enqueue(text.into()).await;
        }
        drop(outbound);

        run_pump(recording_sink(frames_tx), queue, departure.clone()).await;

        let mut seen = Vec::new();
        while let Ok(Message::Text(text)) = frames_rx.try_recv() {
            seen.push(text.as_str().to_string());
        }
        assert_eq!(seen, vec!["one", "two", "three"]);
        assert!(!departure.has_departed());
    }

    #[tokio::test]
    async fn write_failure_deregisters_once() {
        let (coordinator, handle) = Coordinator::new(8);
        let task = tokio::spawn(coordinator.run());

        let conn_id = ConnectionId::new();
        let (outbound, queue) = outbound_queue(8, OverflowPolicy::DropNewest);
        let _ = handle.register(conn_id, outbound.clone()).await;
        let _ = outbound.enqueue("doomed".into()).await;

        let departure = Departure::new(conn_id, handle.clone());
        run_pump(broken_sink(), queue, departure.clone()).await;
        assert!(departure.has_departed());

        // A racing reader-side departure is a no-op.
        assert!(!departure.depart().await);

        let Ok(stats) = handle.stats().await else {
            panic!("coordinator stopped early");
        };
        assert_eq!(stats, HubStats::default());

        let _ = handle.shutdown().await;
        let _ = task.await;
    }
}
