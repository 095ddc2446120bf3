//! Adapter implementations of the notification sink.

mod broadcast;
mod recording;

pub use broadcast::{BroadcastNotificationSink, DEFAULT_CHANNEL_CAPACITY};
pub use recording::RecordingNotificationSink;
