//! Inbound reader: decodes client frames and dispatches them.
//!
//! Queries are answered from the catalog; subscribe and unsubscribe are
//! forwarded to the coordinator. Every reply travels back through the
//! coordinator as a unicast, so it lands on the connection's outbound queue
//! behind anything enqueued earlier.

use std::fmt;
use std::sync::Arc;

use axum::extract::ws::Message;
use futures_util::{Stream, StreamExt};

use super::connection::Departure;
use super::messages::{ReplyBody, WsCommand, WsReply, decode_request, encode_reply};
use crate::domain::{Catalog, QueryCriteria};
use crate::error::GatewayError;
use crate::hub::CoordinatorHandle;

/// Everything a reader needs besides its stream.
#[derive(Debug, Clone)]
pub struct ReaderContext {
    /// Deregister-once guard shared with the pump.
    pub departure: Departure,
    /// Coordinator front door.
    pub coordinator: CoordinatorHandle,
    /// Query data source.
    pub catalog: Arc<Catalog>,
}

/// Reads frames until the peer closes, the transport fails, the pump
/// departs, or the coordinator stops, then departs.
///
/// A frame that fails to decode is answered with an error reply and the
/// loop keeps reading.
pub async fn run_reader<R, E>(mut stream: R, ctx: ReaderContext)
where
    R: Stream<Item = Result<Message, E>> + Unpin,
    E: fmt::Display,
{
    let conn_id = ctx.departure.conn_id();

    loop {
        let frame = tokio::select! {
            frame = stream.next() => frame,
            () = ctx.departure.departed() => {
                tracing::debug!(%conn_id, "connection departed, reader stopping");
                break;
            }
        };
        let dispatched = match frame {
            Some(Ok(Message::Text(text))) => ctx.dispatch(text.as_bytes()).await,
            Some(Ok(Message::Binary(bytes))) => ctx.dispatch(&bytes).await,
            Some(Ok(Message::Ping(_) | Message::Pong(_))) => Ok(()),
            Some(Ok(Message::Close(_))) | None => {
                tracing::debug!(%conn_id, "ws closed by peer");
                break;
            }
            Some(Err(err)) => {
                tracing::warn!(%conn_id, error = %err, "ws read failed");
                break;
            }
        };
        if dispatched.is_err() {
            tracing::debug!(%conn_id, "coordinator gone, reader stopping");
            break;
        }
    }

    ctx.departure.depart().await;
}

impl ReaderContext {
    /// Handles one frame. Fails only when the coordinator has stopped.
    async fn dispatch(&self, frame: &[u8]) -> Result<(), GatewayError> {
        let conn_id = self.departure.conn_id();
        let request = match decode_request(frame) {
            Ok(request) => request,
            Err(err) => {
                tracing::debug!(%conn_id, error = %err, "undecodable frame");
                return self.reply(String::new(), ReplyBody::from_error(&err)).await;
            }
        };

        let body = match request.command {
            WsCommand::Query { id, name, region } => {
                let criteria = QueryCriteria { id, name, region };
                ReplyBody::PokemonList {
                    pokemon: self.catalog.lookup(&criteria),
                }
            }
            WsCommand::Subscribe { channel } => {
                self.coordinator.subscribe(conn_id, channel.clone()).await?;
                ReplyBody::Subscription {
                    message: format!("subscribed to {channel}"),
                    channel,
                }
            }
            WsCommand::Unsubscribe { channel } => {
                self.coordinator.unsubscribe(conn_id, channel.clone()).await?;
                ReplyBody::Subscription {
                    message: format!("unsubscribed from {channel}"),
                    channel,
                }
            }
        };
        self.reply(request.request_id, body).await
    }

    async fn reply(&self, request_id: String, body: ReplyBody) -> Result<(), GatewayError> {
        let conn_id = self.departure.conn_id();
        let payload = match encode_reply(&WsReply::new(request_id.clone(), body)) {
            Ok(payload) => payload,
            Err(err) => {
                tracing::warn!(%conn_id, error = %err, "failed to encode reply");
                match encode_reply(&WsReply::new(request_id, ReplyBody::from_error(&err))) {
                    Ok(payload) => payload,
                    Err(_) => return Ok(()),
                }
            }
        };
        self.coordinator.unicast(conn_id, payload).await
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::ConnectionId;
    use crate::hub::{Coordinator, OutboundReceiver, OverflowPolicy, outbound_queue};
    use futures_util::stream;
    use serde_json::Value;

    struct Harness {
        handle: CoordinatorHandle,
        queue: OutboundReceiver,
        ctx: ReaderContext,
        task: tokio::task::JoinHandle<()>,
    }

    async fn harness() -> Harness {
        let (coordinator, handle) = Coordinator::new(16);
        let task = tokio::spawn(coordinator.run());
        let conn_id = ConnectionId::new();
        let (outbound, queue) = outbound_queue(16, OverflowPolicy::DropNewest);
        let _ = handle.register(conn_id, outbound).await;
        let ctx = ReaderContext {
            departure: Departure::new(conn_id, handle.clone()),
            coordinator: handle.clone(),
            catalog: Arc::new(Catalog::seed()),
        };
        Harness {
            handle,
            queue,
            ctx,
            task,
        }
    }

    async fn next_json(queue: &mut OutboundReceiver) -> Value {
        let Some(payload) = queue.recv().await else {
            panic!("outbound queue closed");
        };
        let Ok(json) = serde_json::from_str(payload.as_str()) else {
            panic!("reply is not json: {}", payload.as_str());
        };
        json
    }

    fn kind(json: &Value) -> Option<&str> {
        json.get("kind").and_then(Value::as_str)
    }

    fn frames(texts: &[&str]) -> impl Stream<Item = Result<Message, String>> + Unpin + use<> {
        let items: Vec<Result<Message, String>> =
            texts.iter().map(|t| Ok(Message::text(*t))).collect();
        stream::iter(items)
    }

    #[tokio::test]
    async fn malformed_frame_gets_error_then_connection_keeps_working() {
        let mut h = harness().await;
        let input = frames(&["{oops", r#"{"request_id":"q1","kind":"query","id":"3"}"#]);
        run_reader(input, h.ctx.clone()).await;

        let error = next_json(&mut h.queue).await;
        assert_eq!(kind(&error), Some("error"));
        assert_ne!(error.get("code").and_then(Value::as_u64), Some(0));

        let list = next_json(&mut h.queue).await;
        assert_eq!(kind(&list), Some("pokemon_list"));
        assert_eq!(list.get("request_id").and_then(Value::as_str), Some("q1"));
        let Some(Value::Array(pokemon)) = list.get("pokemon") else {
            panic!("missing pokemon array");
        };
        assert_eq!(pokemon.len(), 1);

        // Stream end means the peer went away.
        assert!(h.ctx.departure.has_departed());
        let _ = h.handle.shutdown().await;
        let _ = h.task.await;
    }

    #[tokio::test]
    async fn unknown_id_returns_empty_list() {
        let mut h = harness().await;
        run_reader(frames(&[r#"{"kind":"query","id":"999"}"#]), h.ctx.clone()).await;

        let list = next_json(&mut h.queue).await;
        assert_eq!(kind(&list), Some("pokemon_list"));
        assert_eq!(
            list.get("pokemon").and_then(Value::as_array).map(Vec::len),
            Some(0)
        );
        let _ = h.handle.shutdown().await;
        let _ = h.task.await;
    }

    #[tokio::test]
    async fn subscribe_is_acknowledged_and_applied() {
        let mut h = harness().await;
        let conn_id = h.ctx.departure.conn_id();

        // Feed the subscribe directly so the connection stays registered.
        let subscribed = h
            .ctx
            .dispatch(br#"{"kind":"subscribe","channel":"positive"}"#)
            .await;
        assert!(subscribed.is_ok());

        let ack = next_json(&mut h.queue).await;
        assert_eq!(kind(&ack), Some("subscription"));
        assert_eq!(ack.get("channel").and_then(Value::as_str), Some("positive"));

        let _ = h.handle.publish("positive".into(), "tick".into()).await;
        let Some(event) = h.queue.recv().await else {
            panic!("no fan-out received");
        };
        assert_eq!(event.as_str(), "tick");

        let _ = h.ctx.dispatch(br#"{"kind":"unsubscribe","channel":"positive"}"#).await;
        let ack = next_json(&mut h.queue).await;
        assert_eq!(kind(&ack), Some("subscription"));

        let Ok(stats) = h.handle.stats().await else {
            panic!("coordinator stopped early");
        };
        assert_eq!(stats.subscriptions, 0);
        assert_eq!(stats.connections, 1);
        let _ = h.handle.deregister(conn_id).await;
        let _ = h.handle.shutdown().await;
        let _ = h.task.await;
    }

    #[tokio::test]
    async fn binary_frames_are_decoded_too() {
        let mut h = harness().await;
        let input = stream::iter(vec![Ok::<_, String>(Message::Binary(
            br#"{"kind":"query","name":"Pikachu"}"#.to_vec().into(),
        ))]);
        run_reader(input, h.ctx.clone()).await;

        let list = next_json(&mut h.queue).await;
        assert_eq!(kind(&list), Some("pokemon_list"));
        let _ = h.handle.shutdown().await;
        let _ = h.task.await;
    }

    #[tokio::test]
    async fn reader_stops_once_the_pump_departs() {
        let h = harness().await;
        let open_socket = frames(&[r#"{"kind":"query","id":"1"}"#]).chain(stream::pending());
        let reader = tokio::spawn(run_reader(open_socket, h.ctx.clone()));

        // Write-failure path of the pump: release the queue, then depart.
        drop(h.queue);
        assert!(h.ctx.departure.depart().await);

        let finished = tokio::time::timeout(std::time::Duration::from_millis(500), reader).await;
        assert!(matches!(finished, Ok(Ok(()))));

        let Ok(stats) = h.handle.stats().await else {
            panic!("coordinator stopped early");
        };
        assert_eq!(stats.connections, 0);
        let _ = h.handle.shutdown().await;
        let _ = h.task.await;
    }

    #[tokio::test]
    async fn read_error_departs() {
        let h = harness().await;
        let input = stream::iter(vec![Err::<Message, _>("reset by peer".to_string())]);
        run_reader(input, h.ctx.clone()).await;
        assert!(h.ctx.departure.has_departed());

        let Ok(stats) = h.handle.stats().await else {
            panic!("coordinator stopped early");
        };
        assert_eq!(stats.connections, 0);
        let _ = h.handle.shutdown().await;
        let _ = h.task.await;
    }
}
