//! `PostgreSQL` adapters for project persistence.

mod models;
mod repository;
pub(crate) mod schema;

pub use repository::{PostgresProjectRepository, ProjectPgPool};
pub(crate) use repository::{load_project, next_member_position};
