//! Membership coordinator for Atelier.
//!
//! Resolves invitations on behalf of invitees. Acceptance is the one
//! operation that spans two aggregates: the invitation becomes `accepted`
//! and the invitee joins the project in a single commit, so neither state
//! is ever observable without the other. Rejection touches the invitation
//! only.
//!
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
