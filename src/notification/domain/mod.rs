//! Event payloads broadcast to project-scoped channels.

mod event;

pub use event::{MembershipChange, ProjectEvent};
