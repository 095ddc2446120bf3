//! Atelier: project collaboration backend.
//!
//! Users own projects, invite collaborators, and track tasks inside the
//! projects they belong to. The core of the crate is the membership
//! lifecycle: an invitation is created by a project owner, then accepted,
//! rejected, cancelled, or left to expire, and acceptance adds the invitee
//! to the project in the same commit that marks the invitation accepted.
//!
//! # Architecture
//!
//! Each bounded context follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (memory, `PostgreSQL`)
//! - **Services**: Orchestration and authorization
//!
//! # Modules
//!
//! - [`identity`]: User identifiers, profiles, and directory lookups
//! - [`project`]: Projects, ownership, and membership
//! - [`invitation`]: Invitation records and their creation and cancellation
//! - [`membership`]: Atomic acceptance and rejection of invitations
//! - [`task`]: Project tasks and analytics
//! - [`notification`]: Best-effort project event fan-out
//! - [`api`]: HTTP surface
//! - [`config`] and [`telemetry`]: Process configuration and logging

pub mod api;
pub mod config;
pub mod error;
pub mod identity;
pub mod invitation;
pub mod membership;
pub mod notification;
pub mod project;
pub mod task;
pub mod telemetry;

#[cfg(test)]
mod test_support;
