//! Port contracts for membership changes driven by invitations.

pub mod acceptance;

#[cfg(test)]
pub use acceptance::MockAcceptanceStore;
pub use acceptance::{AcceptanceStore, AcceptanceStoreError, AcceptanceStoreResult};
