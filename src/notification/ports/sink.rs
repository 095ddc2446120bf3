//! Fire-and-forget notification sink port.

use crate::notification::domain::ProjectEvent;
use thiserror::Error;

/// Destination for project events.
///
/// `publish` must not block on consumers; implementations hand the event
/// off and return immediately.
#[cfg_attr(test, mockall::automock)]
pub trait NotificationSink: Send + Sync {
    /// Hands `event` to the transport.
    ///
    /// # Errors
    ///
    /// Returns [`NotificationError`] when the event could not be handed off.
    /// Callers treat every error as non-fatal.
    fn publish(&self, event: ProjectEvent) -> Result<(), NotificationError>;
}

/// Errors returned by notification sinks.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NotificationError {
    /// Nobody is listening; the event was dropped.
    #[error("no subscribers for project events")]
    NoSubscribers,

    /// The transport rejected the event.
    #[error("notification transport failed: {0}")]
    Transport(String),
}
