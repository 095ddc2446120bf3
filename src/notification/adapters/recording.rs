//! Sink that keeps every published event, for tests.

use crate::notification::{
    domain::ProjectEvent,
    ports::{NotificationError, NotificationSink},
};
use std::sync::{Arc, Mutex};

/// Records events in publication order.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotificationSink {
    events: Arc<Mutex<Vec<ProjectEvent>>>,
}

impl RecordingNotificationSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every recorded event.
    #[must_use]
    pub fn events(&self) -> Vec<ProjectEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl NotificationSink for RecordingNotificationSink {
    fn publish(&self, event: ProjectEvent) -> Result<(), NotificationError> {
        let mut events = self
            .events
            .lock()
            .map_err(|err| NotificationError::Transport(err.to_string()))?;
        events.push(event);
        Ok(())
    }
}
