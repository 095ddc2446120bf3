//! Error types for invitation domain validation and parsing.

use super::{InvitationId, InvitationStatus};
use thiserror::Error;

/// Errors returned while constructing or transitioning invitations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InvitationDomainError {
    /// The invitation message exceeds the 500-character limit.
    #[error("invitation message exceeds {max} characters (got {actual})")]
    MessageTooLong {
        /// Maximum accepted length.
        max: usize,
        /// Length of the rejected value.
        actual: usize,
    },

    /// The default message template could not be rendered.
    #[error("failed to render invitation message: {0}")]
    MessageTemplate(String),

    /// The invitation has already left the pending state.
    #[error("invitation {id} has already been processed (status: {status})")]
    AlreadyProcessed {
        /// Invitation identifier.
        id: InvitationId,
        /// Current terminal status.
        status: InvitationStatus,
    },
}

/// Error returned while parsing invitation status from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown invitation status: {0}")]
pub struct ParseInvitationStatusError(pub String);
