//! In-memory invitation adapters.

mod repository;

pub use repository::InMemoryInvitationRepository;
