//! Identity directory for Atelier.
//!
//! Users are owned by an external identity provider. This module only
//! resolves opaque user identifiers to existence and display data, and
//! provides the single canonicalisation rule used for every identifier
//! comparison in the crate:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Username search in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
