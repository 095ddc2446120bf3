//! Task tracking for Atelier projects.
//!
//! Tasks are filed under a project and visible to its members only. Every
//! task is referenced from its project's task set; creating and deleting a
//! task keeps both sides in step, and each change is announced on the
//! project's event channel:
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
