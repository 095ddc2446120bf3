//! Adapter implementations for invitation ports.

pub mod memory;
pub mod postgres;
