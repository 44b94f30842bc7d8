use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "native")]
use tokio::sync::broadcast;

/// Local presence modes an adapter can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PresenceStatus {
    /// Attending messages
    Online,
    /// Not attending messages, optionally with an away message
    Away,
}

impl PresenceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PresenceStatus::Online => "online",
            PresenceStatus::Away => "away",
        }
    }
}

impl std::fmt::Display for PresenceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receives confirmed presence transitions from a protocol adapter.
pub trait PresenceStatusListener: Send + Sync + 'static {
    fn update_presence_status(&self, previous: PresenceStatus, current: PresenceStatus);
}

/// A confirmed presence transition, as delivered to broadcast subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
    pub previous: PresenceStatus,
    pub current: PresenceStatus,
    pub timestamp: DateTime<Utc>,
}

/// Fans presence transitions out to any number of async subscribers.
#[cfg(feature = "native")]
#[derive(Clone)]
pub struct BroadcastStatusSink {
    sender: broadcast::Sender<StatusChange>,
}

#[cfg(feature = "native")]
impl BroadcastStatusSink {
    pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

    pub fn new(channel_capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(channel_capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StatusChange> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[cfg(feature = "native")]
impl Default for BroadcastStatusSink {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CHANNEL_CAPACITY)
    }
}

#[cfg(feature = "native")]
impl PresenceStatusListener for BroadcastStatusSink {
    fn update_presence_status(&self, previous: PresenceStatus, current: PresenceStatus) {
        let change = StatusChange {
            previous,
            current,
            timestamp: Utc::now(),
        };
        // No subscribers is not an error; the change is simply unobserved.
        if self.sender.send(change).is_err() {
            tracing::trace!(%previous, %current, "presence change had no subscribers");
        }
    }
}
