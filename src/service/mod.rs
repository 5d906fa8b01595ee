//! Service layer: background producers feeding the hub.

pub mod publisher;

pub use publisher::{ChannelFeed, Publisher};
