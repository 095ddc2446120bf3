//! Project registry for Atelier.
//!
//! Owns project records, their membership set, and the references to the
//! tasks filed under each project. Every mutation goes through the
//! aggregate's single invariant-preserving mutator so that the owner is a
//! member at all times, and every persisted change is guarded by an
//! optimistic version check:
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
