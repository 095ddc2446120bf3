//! Step definitions for invitation lifecycle scenarios.

mod given;
mod then;
mod when;
pub mod world;
