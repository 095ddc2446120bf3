//! Domain model for project invitations.

mod error;
mod ids;
mod invitation;
mod message;
mod status;

pub use error::{InvitationDomainError, ParseInvitationStatusError};
pub use ids::InvitationId;
pub use invitation::{INVITATION_TTL_DAYS, Invitation, NewInvitation, PersistedInvitationData};
pub use message::InvitationMessage;
pub use status::InvitationStatus;
