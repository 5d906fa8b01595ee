//! Domain layer: connection identity, channels, subscriptions, and the
//! read-only Pokedex catalog.

pub mod channel;
pub mod connection_id;
pub mod pokemon;
pub mod subscription;

pub use channel::ChannelName;
pub use connection_id::ConnectionId;
pub use pokemon::{Catalog, Pokemon, QueryCriteria};
pub use subscription::SubscriptionSet;
