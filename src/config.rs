//! Gateway configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`).

use std::net::SocketAddr;
use std::time::Duration;

use crate::hub::OverflowPolicy;

/// Top-level gateway configuration.
///
/// Loaded once at startup via [`GatewayConfig::from_env`].
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Socket address to bind the HTTP server to (e.g. `0.0.0.0:8080`).
    pub listen_addr: SocketAddr,

    /// Path on which WebSocket upgrades are accepted.
    pub ws_path: String,

    /// Capacity of each connection's outbound queue.
    pub outbound_queue_capacity: usize,

    /// What the coordinator does when an outbound queue is full.
    pub overflow_policy: OverflowPolicy,

    /// Capacity of each coordinator inbox.
    pub coordinator_queue_capacity: usize,

    /// Period between publisher ticks.
    pub publish_interval: Duration,
}

impl GatewayConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to sensible defaults when a variable is not set.
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns an error if `LISTEN_ADDR` is set but cannot be parsed as
    /// a [`SocketAddr`].
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();

        let listen_addr: SocketAddr = std::env::var("LISTEN_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
            .parse()?;

        let ws_path = std::env::var("WS_PATH")
            .ok()
            .filter(|p| p.starts_with('/'))
            .unwrap_or_else(|| "/ws".to_string());

        let outbound_queue_capacity = parse_env("OUTBOUND_QUEUE_CAPACITY", 64_usize).max(1);
        let overflow_policy = parse_env("OUTBOUND_OVERFLOW_POLICY", OverflowPolicy::DropNewest);
        let coordinator_queue_capacity =
            parse_env("COORDINATOR_QUEUE_CAPACITY", 1024_usize).max(1);
        let publish_interval =
            Duration::from_millis(parse_env("PUBLISH_INTERVAL_MS", 1000_u64).max(1));

        Ok(Self {
            listen_addr,
            ws_path,
            outbound_queue_capacity,
            overflow_policy,
            coordinator_queue_capacity,
            publish_interval,
        })
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            ws_path: "/ws".to_string(),
            outbound_queue_capacity: 64,
            overflow_policy: OverflowPolicy::DropNewest,
            coordinator_queue_capacity: 1024,
            publish_interval: Duration::from_secs(1),
        }
    }
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
