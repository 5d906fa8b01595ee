//! WebSocket layer: upgrade, per-connection reader and pump, wire codec.
//!
//! Each upgraded connection gets two tasks: an inbound reader that decodes
//! requests and feeds the coordinator, and an outbound pump that is the
//! only writer to the socket.

pub mod connection;
pub mod handler;
pub mod messages;
pub mod pump;
pub mod reader;
