//! Tokio broadcast channel sink for in-process subscribers.

use crate::notification::{
    domain::ProjectEvent,
    ports::{NotificationError, NotificationSink},
};
use tokio::sync::broadcast;

/// Default number of buffered events before slow subscribers start lagging.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Fans project events out to every live subscriber.
///
/// Subscribers that fall behind lose the oldest events; there is no replay.
#[derive(Debug, Clone)]
pub struct BroadcastNotificationSink {
    sender: broadcast::Sender<ProjectEvent>,
}

impl BroadcastNotificationSink {
    /// Creates a sink buffering up to `capacity` events per subscriber.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Subscribes to every event published after this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ProjectEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for BroadcastNotificationSink {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}

impl NotificationSink for BroadcastNotificationSink {
    fn publish(&self, event: ProjectEvent) -> Result<(), NotificationError> {
        self.sender
            .send(event)
            .map(|_| ())
            .map_err(|_| NotificationError::NoSubscribers)
    }
}
