//! Port contracts for event delivery.

pub mod sink;

#[cfg(test)]
pub use sink::MockNotificationSink;
pub use sink::{NotificationError, NotificationSink};
