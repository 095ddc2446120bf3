//! Domain model for project records and membership.
//!
//! Infrastructure concerns stay outside of the domain boundary; the
//! aggregate only knows about identifiers, validated text, and the clock.

mod change;
mod error;
mod ids;
mod name;
mod project;

pub use change::ProjectChange;
pub use error::ProjectDomainError;
pub use ids::ProjectId;
pub use name::{ProjectDescription, ProjectName};
pub use project::{PersistedProjectData, Project};
