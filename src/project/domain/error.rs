//! Error types for project domain validation.

use super::ProjectId;
use thiserror::Error;

/// Errors returned while constructing project domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProjectDomainError {
    /// The project name is empty after trimming.
    #[error("project name must not be empty")]
    EmptyProjectName,

    /// The project name exceeds the 100-character limit.
    #[error("project name exceeds {max} characters (got {actual})")]
    ProjectNameTooLong {
        /// Maximum accepted length.
        max: usize,
        /// Length of the rejected value.
        actual: usize,
    },

    /// The project description exceeds the 500-character limit.
    #[error("project description exceeds {max} characters (got {actual})")]
    DescriptionTooLong {
        /// Maximum accepted length.
        max: usize,
        /// Length of the rejected value.
        actual: usize,
    },

    /// A persisted project does not list its owner as a member.
    #[error("project {0} does not list its owner as a member")]
    OwnerNotMember(ProjectId),
}
