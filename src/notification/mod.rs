//! Best-effort project event notifications.
//!
//! Services emit [`domain::ProjectEvent`] values after a state change has
//! been committed. Delivery is at most once with no acknowledgement and no
//! replay; a failed delivery is logged and never changes the result of the
//! operation that produced the event.

pub mod adapters;
pub mod domain;
pub mod ports;

use ports::NotificationSink;

/// Publishes `event`, logging instead of propagating any delivery failure.
pub fn publish_best_effort<N>(sink: &N, event: domain::ProjectEvent)
where
    N: NotificationSink + ?Sized,
{
    let name = event.name();
    let channel = event.channel();
    match sink.publish(event) {
        Ok(()) => tracing::debug!(event = name, %channel, "project event published"),
        Err(ports::NotificationError::NoSubscribers) => {
            tracing::debug!(event = name, %channel, "project event dropped, no subscribers");
        }
        Err(err) => {
            tracing::warn!(event = name, %channel, error = %err, "project event delivery failed");
        }
    }
}
