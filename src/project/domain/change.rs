//! Set-valued changes that commute with concurrent writers.

use crate::identity::domain::UserId;
use crate::task::domain::TaskId;

/// A single membership or task-reference change.
///
/// Each change is idempotent and independent of the rest of the aggregate,
/// so storage can apply it to the current row instead of a loaded snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectChange {
    /// Add a member.
    AddMember(UserId),
    /// Remove a member. Refused for the owner.
    RemoveMember(UserId),
    /// Reference a task.
    AddTaskRef(TaskId),
    /// Drop a task reference.
    RemoveTaskRef(TaskId),
}
