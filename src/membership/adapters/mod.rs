//! Adapter implementations of the acceptance store.

mod memory;
mod postgres;

pub use memory::InMemoryAcceptanceStore;
pub use postgres::PostgresAcceptanceStore;
