//! In-memory project adapters.

mod repository;

pub use repository::InMemoryProjectRepository;
