//! Per-connection subscription set.
//!
//! Tracks which channels a client is subscribed to. Owned exclusively by
//! the coordinator; no other component reads or writes it.

use std::collections::HashSet;

use super::ChannelName;

/// The set of channels a single connection is subscribed to.
#[derive(Debug, Default)]
pub struct SubscriptionSet {
    channels: HashSet<ChannelName>,
}

impl SubscriptionSet {
    /// Creates a new empty subscription set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a channel. Returns `false` if it was already present.
    pub fn subscribe(&mut self, channel: ChannelName) -> bool {
        self.channels.insert(channel)
    }

    /// Removes a channel. Returns `false` if it was not present.
    pub fn unsubscribe(&mut self, channel: &str) -> bool {
        self.channels.remove(channel)
    }

    /// Returns `true` if the connection is subscribed to `channel`.
    #[must_use]
    pub fn matches(&self, channel: &str) -> bool {
        self.channels.contains(channel)
    }

    /// Returns the number of subscribed channels.
    #[must_use]
    pub fn count(&self) -> usize {
        self.channels.len()
    }

    /// Iterates over the subscribed channels in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = &ChannelName> {
        self.channels.iter()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn empty_matches_nothing() {
        let subs = SubscriptionSet::new();
        assert!(!subs.matches("positive"));
        assert_eq!(subs.count(), 0);
    }

    #[test]
    fn subscribe_is_idempotent() {
        let mut subs = SubscriptionSet::new();
        assert!(subs.subscribe("positive".into()));
        assert!(!subs.subscribe("positive".into()));
        assert_eq!(subs.count(), 1);
        assert!(subs.matches("positive"));
        assert!(!subs.matches("negative"));
    }

    #[test]
    fn unsubscribe_removes_channel() {
        let mut subs = SubscriptionSet::new();
        subs.subscribe("negative".into());
        assert!(subs.unsubscribe("negative"));
        assert!(!subs.matches("negative"));
        assert!(!subs.unsubscribe("negative"));
    }

    #[test]
    fn any_string_is_a_channel() {
        let mut subs = SubscriptionSet::new();
        subs.subscribe("".into());
        subs.subscribe("weather/berlin".into());
        assert!(subs.matches(""));
        assert!(subs.matches("weather/berlin"));
        assert_eq!(subs.iter().count(), 2);
    }
}
