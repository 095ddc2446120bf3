//! Request bodies and their conversion into service requests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

use crate::identity::domain::UserId;
use crate::invitation::services::CreateInvitationRequest;
use crate::project::services::{CreateProjectRequest, UpdateProjectRequest};
use crate::task::domain::{TaskPriority, TaskStatus};
use crate::task::services::{CreateTaskRequest, UpdateTaskRequest};

/// Body of `POST /projects`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProjectBody {
    /// Project name.
    pub name: String,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
}

impl From<CreateProjectBody> for CreateProjectRequest {
    fn from(body: CreateProjectBody) -> Self {
        let mut request = Self::new(body.name);
        if let Some(description) = body.description {
            request = request.with_description(description);
        }
        request
    }
}

/// Body of `PUT /projects/{id}`. A blank description clears it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProjectBody {
    /// New name.
    #[serde(default)]
    pub name: Option<String>,
    /// New description.
    #[serde(default)]
    pub description: Option<String>,
}

impl From<UpdateProjectBody> for UpdateProjectRequest {
    fn from(body: UpdateProjectBody) -> Self {
        let mut request = Self::new();
        if let Some(name) = body.name {
            request = request.with_name(name);
        }
        if let Some(description) = body.description {
            request = request.with_description(description);
        }
        request
    }
}

/// Body of `POST /projects/{id}/members`.
#[derive(Debug, Clone, Deserialize)]
pub struct AddMemberBody {
    /// Username of the user to add.
    pub username: String,
}

/// Body of `POST /projects/{id}/invitations`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvitationBody {
    /// User being invited.
    pub invitee_id: UserId,
    /// Optional custom message.
    #[serde(default)]
    pub message: Option<String>,
}

impl From<CreateInvitationBody> for CreateInvitationRequest {
    fn from(body: CreateInvitationBody) -> Self {
        let mut request = Self::new(body.invitee_id);
        if let Some(message) = body.message {
            request = request.with_message(message);
        }
        request
    }
}

/// Body of `POST /projects/{id}/tasks`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskBody {
    /// Title.
    pub title: String,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
    /// Priority; `Medium` when absent.
    #[serde(default)]
    pub priority: Option<TaskPriority>,
    /// Optional due date.
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    /// Optional assignee.
    #[serde(default)]
    pub assignee: Option<UserId>,
}

impl From<CreateTaskBody> for CreateTaskRequest {
    fn from(body: CreateTaskBody) -> Self {
        let CreateTaskBody {
            title,
            description,
            priority,
            due_date,
            assignee,
        } = body;
        let mut request = Self::new(title);
        if let Some(text) = description {
            request = request.with_description(text);
        }
        if let Some(level) = priority {
            request = request.with_priority(level);
        }
        if let Some(due) = due_date {
            request = request.with_due_date(due);
        }
        if let Some(user) = assignee {
            request = request.with_assignee(user);
        }
        request
    }
}

/// Body of `PUT /projects/{id}/tasks/{task_id}`.
///
/// Absent fields stay untouched. An explicit `null` clears `dueDate` and
/// `assignee`; a blank `description` clears the description.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskBody {
    /// New title.
    #[serde(default)]
    pub title: Option<String>,
    /// New description.
    #[serde(default)]
    pub description: Option<String>,
    /// New status.
    #[serde(default)]
    pub status: Option<TaskStatus>,
    /// New priority.
    #[serde(default)]
    pub priority: Option<TaskPriority>,
    /// New or cleared due date.
    #[serde(default, deserialize_with = "present")]
    pub due_date: Option<Option<DateTime<Utc>>>,
    /// New or cleared assignee.
    #[serde(default, deserialize_with = "present")]
    pub assignee: Option<Option<UserId>>,
}

impl From<UpdateTaskBody> for UpdateTaskRequest {
    fn from(body: UpdateTaskBody) -> Self {
        let UpdateTaskBody {
            title,
            description,
            status,
            priority,
            due_date,
            assignee,
        } = body;
        let mut request = Self::new();
        if let Some(text) = title {
            request = request.with_title(text);
        }
        if let Some(text) = description {
            request = request.with_description(text);
        }
        if let Some(state) = status {
            request = request.with_status(state);
        }
        if let Some(level) = priority {
            request = request.with_priority(level);
        }
        if let Some(due) = due_date {
            request = request.with_due_date(due);
        }
        if let Some(user) = assignee {
            request = request.with_assignee(user);
        }
        request
    }
}

/// Query string of `GET /users/search`.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchQuery {
    /// Username fragment.
    pub username: String,
}

/// Distinguishes an explicit `null` from an absent field.
fn present<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
