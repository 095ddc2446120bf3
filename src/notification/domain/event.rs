//! Project event types.

use crate::identity::domain::UserId;
use crate::invitation::domain::InvitationId;
use crate::project::domain::ProjectId;
use crate::task::domain::{Task, TaskId};
use serde::{Deserialize, Serialize};

/// How a membership change came about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MembershipChange {
    /// The user accepted an invitation.
    Joined {
        /// Invitation that was accepted.
        invitation_id: InvitationId,
    },
    /// The owner added the user directly.
    Added,
    /// The user was removed from the project.
    Removed,
}

/// Event emitted after a project-scoped state change has been committed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum ProjectEvent {
    /// Project membership changed.
    #[serde(rename_all = "camelCase")]
    MembershipChanged {
        /// Affected project.
        project_id: ProjectId,
        /// Affected user.
        user_id: UserId,
        /// Nature of the change.
        change: MembershipChange,
    },
    /// A task was created.
    #[serde(rename_all = "camelCase")]
    TaskCreated {
        /// Owning project.
        project_id: ProjectId,
        /// Task as created.
        task: Task,
    },
    /// A task was updated.
    #[serde(rename_all = "camelCase")]
    TaskUpdated {
        /// Owning project.
        project_id: ProjectId,
        /// Task after the update.
        task: Task,
    },
    /// A task was deleted.
    #[serde(rename_all = "camelCase")]
    TaskDeleted {
        /// Owning project.
        project_id: ProjectId,
        /// Deleted task identifier.
        task_id: TaskId,
    },
}

impl ProjectEvent {
    /// Returns the project the event belongs to.
    #[must_use]
    pub const fn project_id(&self) -> ProjectId {
        match self {
            Self::MembershipChanged { project_id, .. }
            | Self::TaskCreated { project_id, .. }
            | Self::TaskUpdated { project_id, .. }
            | Self::TaskDeleted { project_id, .. } => *project_id,
        }
    }

    /// Returns the wire name of the event.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::MembershipChanged { .. } => "membershipChanged",
            Self::TaskCreated { .. } => "taskCreated",
            Self::TaskUpdated { .. } => "taskUpdated",
            Self::TaskDeleted { .. } => "taskDeleted",
        }
    }

    /// Returns the project-scoped channel name, `project-<id>`.
    #[must_use]
    pub fn channel(&self) -> String {
        format!("project-{}", self.project_id())
    }
}
