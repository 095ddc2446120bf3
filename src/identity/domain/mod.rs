//! Domain model for user identity lookups.

mod error;
mod ids;
mod profile;

pub use error::IdentityDomainError;
pub use ids::{AsUserId, UserId};
pub use profile::{UserProfile, Username};
