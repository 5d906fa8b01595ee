//! Periodic channel publisher.
//!
//! Every tick draws one random value per configured feed and submits it to
//! the coordinator for fan-out. Nothing carries over between ticks.

use std::time::Duration;

use rand::Rng;

use crate::domain::ChannelName;
use crate::error::GatewayError;
use crate::hub::{CoordinatorHandle, Payload};
use crate::ws::messages::{ReplyBody, WsReply, encode_reply};

/// A channel and the values it carries: `base + u * span` with `u` uniform
/// in `[0, 1)`. `base` is always reachable and `base + span` never is.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelFeed {
    /// Channel the values are published on.
    pub channel: ChannelName,
    /// Value drawn when `u` is zero.
    pub base: f64,
    /// Signed width of the range.
    pub span: f64,
}

impl ChannelFeed {
    /// Values in `[10, 100)` on the `positive` channel.
    #[must_use]
    pub fn positive() -> Self {
        Self {
            channel: ChannelName::from(ChannelName::POSITIVE),
            base: 10.0,
            span: 90.0,
        }
    }

    /// Values in `(-100, -10]` on the `negative` channel.
    #[must_use]
    pub fn negative() -> Self {
        Self {
            channel: ChannelName::from(ChannelName::NEGATIVE),
            base: -10.0,
            span: -90.0,
        }
    }

    /// Whether `value` could have come from this feed.
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        let end = self.base + self.span;
        if self.span >= 0.0 {
            value >= self.base && value < end
        } else {
            value <= self.base && value > end
        }
    }

    /// The feeds the server publishes by default.
    #[must_use]
    pub fn defaults() -> Vec<Self> {
        vec![Self::positive(), Self::negative()]
    }

    fn sample<R: Rng>(&self, rng: &mut R) -> f64 {
        self.base + rng.r#gen::<f64>() * self.span
    }
}

/// Timer-driven source of channel events.
#[derive(Debug)]
pub struct Publisher {
    coordinator: CoordinatorHandle,
    feeds: Vec<ChannelFeed>,
    interval: Duration,
}

impl Publisher {
    /// Creates a publisher for the default feeds.
    #[must_use]
    pub fn new(coordinator: CoordinatorHandle, interval: Duration) -> Self {
        Self {
            coordinator,
            feeds: ChannelFeed::defaults(),
            interval,
        }
    }

    /// Channels this publisher feeds.
    #[must_use]
    pub fn channels(&self) -> Vec<ChannelName> {
        self.feeds.iter().map(|f| f.channel.clone()).collect()
    }

    /// Publishes one tick per interval until the coordinator stops.
    ///
    /// A slow fan-out never delays value generation; it only backs up the
    /// coordinator's publication inbox.
    pub async fn run(self) {
        let mut ticker = tokio::time::interval(self.interval);
        tracing::info!(
            interval_ms = u64::try_from(self.interval.as_millis()).unwrap_or(u64::MAX),
            feeds = self.feeds.len(),
            "publisher started"
        );
        loop {
            ticker.tick().await;
            match self.publish_tick().await {
                Ok(published) => tracing::trace!(published, "publisher tick"),
                Err(GatewayError::CoordinatorUnavailable) => {
                    tracing::info!("coordinator gone, publisher stopping");
                    break;
                }
                Err(err) => tracing::warn!(error = %err, "publisher tick failed"),
            }
        }
    }

    /// Draws and submits one value per feed. Returns how many were submitted.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::CoordinatorUnavailable`] if the coordinator
    /// has stopped, or [`GatewayError::EncodeFailed`] if an event could not
    /// be encoded.
    pub async fn publish_tick(&self) -> Result<usize, GatewayError> {
        let events = self.draw()?;
        let published = events.len();
        for (channel, payload) in events {
            self.coordinator.publish(channel, payload).await?;
        }
        Ok(published)
    }

    fn draw(&self) -> Result<Vec<(ChannelName, Payload)>, GatewayError> {
        let mut rng = rand::thread_rng();
        self.feeds
            .iter()
            .map(|feed| {
                let value = feed.sample(&mut rng);
                let reply = WsReply::new(
                    String::new(),
                    ReplyBody::ChannelEvent {
                        channel: feed.channel.clone(),
                        message: value.to_string(),
                    },
                );
                Ok((feed.channel.clone(), encode_reply(&reply)?))
            })
            .collect()
    }
}
