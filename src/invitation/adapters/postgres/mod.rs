//! `PostgreSQL` adapters for invitation persistence.

mod models;
mod repository;
pub(crate) mod schema;

pub use repository::PostgresInvitationRepository;
pub(crate) use repository::resolve_pending;
