//! Invitation ledger for Atelier.
//!
//! Owns invitation records and their state machine. An invitation starts
//! `pending` and leaves that state exactly once, either to `accepted` or to
//! `rejected`; while pending it may instead be hard-deleted by the inviter.
//! At most one pending invitation exists per project and invitee, enforced
//! by the storage layer:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
