//! # pokedex-gateway
//!
//! Real-time WebSocket message hub. Clients either send one-shot queries
//! against a small read-only Pokedex (answered with a unicast reply) or
//! subscribe to named channels and receive the values a periodic publisher
//! fans out to every current subscriber.
//!
//! ## Architecture
//!
//! ```text
//! Clients (WebSocket, HTTP)
//!     │
//!     ├── Inbound Reader (ws/reader)  ──┐
//!     │                                 ▼
//!     │                     Coordinator (hub/coordinator)  ◀── Publisher (service/)
//!     │                                 │
//!     ├── Outbound Pump (ws/pump)  ◀────┘  per-connection bounded queue
//!     │
//!     └── REST Handlers (api/)  ── stats via the coordinator, lookups via Catalog
//! ```
//!
//! The coordinator is the only owner of the live-connection set and of
//! every subscription set. Everything else talks to it through channels.

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod hub;
pub mod server;
pub mod service;
pub mod ws;
