//! Request handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use mockable::Clock;
use serde_json::{Value, json};

use super::{
    AddMemberBody, ApiError, Caller, CreateInvitationBody, CreateProjectBody, CreateTaskBody,
    SearchQuery, UpdateProjectBody, UpdateTaskBody, state::AppState,
};
use crate::identity::domain::UserProfile;
use crate::invitation::domain::{Invitation, InvitationId};
use crate::project::domain::{Project, ProjectId};
use crate::task::domain::{ProjectAnalytics, Task, TaskId};

/// Result of a handler that answers with a JSON document.
pub type ApiResult = Result<Json<Value>, ApiError>;

/// Result of a handler that creates a resource.
pub type CreatedResult = Result<(StatusCode, Json<Value>), ApiError>;

fn created(body: Value) -> (StatusCode, Json<Value>) {
    (StatusCode::CREATED, Json(body))
}

/// Liveness check.
pub async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// `POST /projects`
pub async fn create_project<C>(
    State(state): State<Arc<AppState<C>>>,
    Caller(user): Caller,
    Json(body): Json<CreateProjectBody>,
) -> CreatedResult
where
    C: Clock + Send + Sync + 'static,
{
    let project = state.projects.create_project(user, body.into()).await?;
    Ok(created(json!({ "message": "Project created successfully", "project": project })))
}

/// `GET /projects`
pub async fn list_projects<C>(
    State(state): State<Arc<AppState<C>>>,
    Caller(user): Caller,
) -> Result<Json<Vec<Project>>, ApiError>
where
    C: Clock + Send + Sync + 'static,
{
    let projects = state.projects.list_for_member(user).await?;
    Ok(Json(projects))
}

/// `GET /projects/{id}`
pub async fn get_project<C>(
    State(state): State<Arc<AppState<C>>>,
    Caller(user): Caller,
    Path(project_id): Path<ProjectId>,
) -> Result<Json<Project>, ApiError>
where
    C: Clock + Send + Sync + 'static,
{
    let project = state.projects.get_project(project_id, user).await?;
    Ok(Json(project))
}

/// `PUT /projects/{id}`
pub async fn update_project<C>(
    State(state): State<Arc<AppState<C>>>,
    Caller(user): Caller,
    Path(project_id): Path<ProjectId>,
    Json(body): Json<UpdateProjectBody>,
) -> ApiResult
where
    C: Clock + Send + Sync + 'static,
{
    let project = state
        .projects
        .update_details(project_id, user, body.into())
        .await?;
    Ok(Json(
        json!({ "message": "Project updated successfully", "project": project }),
    ))
}

/// `POST /projects/{id}/members`
pub async fn add_member<C>(
    State(state): State<Arc<AppState<C>>>,
    Caller(user): Caller,
    Path(project_id): Path<ProjectId>,
    Json(body): Json<AddMemberBody>,
) -> ApiResult
where
    C: Clock + Send + Sync + 'static,
{
    let project = state
        .projects
        .add_member_by_username(project_id, user, &body.username)
        .await?;
    Ok(Json(
        json!({ "message": "Member added successfully", "project": project }),
    ))
}

/// `POST /projects/{id}/invitations`
pub async fn create_invitation<C>(
    State(state): State<Arc<AppState<C>>>,
    Caller(user): Caller,
    Path(project_id): Path<ProjectId>,
    Json(body): Json<CreateInvitationBody>,
) -> CreatedResult
where
    C: Clock + Send + Sync + 'static,
{
    let invitation = state
        .invitations
        .create(project_id, user, body.into())
        .await?;
    Ok(created(json!({ "message": "Invitation sent successfully", "invitation": invitation })))
}

/// `GET /projects/{id}/invitations`
pub async fn list_project_invitations<C>(
    State(state): State<Arc<AppState<C>>>,
    Caller(user): Caller,
    Path(project_id): Path<ProjectId>,
) -> Result<Json<Vec<Invitation>>, ApiError>
where
    C: Clock + Send + Sync + 'static,
{
    let invitations = state.invitations.list_for_project(project_id, user).await?;
    Ok(Json(invitations))
}

/// `GET /invitations`
pub async fn list_my_invitations<C>(
    State(state): State<Arc<AppState<C>>>,
    Caller(user): Caller,
) -> Result<Json<Vec<Invitation>>, ApiError>
where
    C: Clock + Send + Sync + 'static,
{
    let invitations = state.invitations.list_for_invitee(user).await?;
    Ok(Json(invitations))
}

/// `PUT /invitations/{id}/accept`
pub async fn accept_invitation<C>(
    State(state): State<Arc<AppState<C>>>,
    Caller(user): Caller,
    Path(invitation_id): Path<InvitationId>,
) -> ApiResult
where
    C: Clock + Send + Sync + 'static,
{
    let accepted = state.membership.accept(invitation_id, user).await?;
    Ok(Json(json!({
        "message": "Invitation accepted successfully",
        "invitation": accepted.invitation,
        "project": accepted.project,
    })))
}

/// `PUT /invitations/{id}/reject`
pub async fn reject_invitation<C>(
    State(state): State<Arc<AppState<C>>>,
    Caller(user): Caller,
    Path(invitation_id): Path<InvitationId>,
) -> ApiResult
where
    C: Clock + Send + Sync + 'static,
{
    let invitation = state.membership.reject(invitation_id, user).await?;
    Ok(Json(json!({
        "message": "Invitation rejected successfully",
        "invitation": invitation,
    })))
}

/// `DELETE /invitations/{id}`
pub async fn cancel_invitation<C>(
    State(state): State<Arc<AppState<C>>>,
    Caller(user): Caller,
    Path(invitation_id): Path<InvitationId>,
) -> ApiResult
where
    C: Clock + Send + Sync + 'static,
{
    state.invitations.cancel(invitation_id, user).await?;
    Ok(Json(json!({ "message": "Invitation cancelled successfully" })))
}

/// `POST /projects/{id}/tasks`
pub async fn create_task<C>(
    State(state): State<Arc<AppState<C>>>,
    Caller(user): Caller,
    Path(project_id): Path<ProjectId>,
    Json(body): Json<CreateTaskBody>,
) -> CreatedResult
where
    C: Clock + Send + Sync + 'static,
{
    let task = state.tasks.create(project_id, user, body.into()).await?;
    Ok(created(json!({ "message": "Task created successfully", "task": task })))
}

/// `GET /projects/{id}/tasks`
pub async fn list_tasks<C>(
    State(state): State<Arc<AppState<C>>>,
    Caller(user): Caller,
    Path(project_id): Path<ProjectId>,
) -> Result<Json<Vec<Task>>, ApiError>
where
    C: Clock + Send + Sync + 'static,
{
    let tasks = state.tasks.list(project_id, user).await?;
    Ok(Json(tasks))
}

/// `PUT /projects/{id}/tasks/{task_id}`
pub async fn update_task<C>(
    State(state): State<Arc<AppState<C>>>,
    Caller(user): Caller,
    Path((project_id, task_id)): Path<(ProjectId, TaskId)>,
    Json(body): Json<UpdateTaskBody>,
) -> ApiResult
where
    C: Clock + Send + Sync + 'static,
{
    let task = state
        .tasks
        .update(project_id, task_id, user, body.into())
        .await?;
    Ok(Json(
        json!({ "message": "Task updated successfully", "task": task }),
    ))
}

/// `DELETE /projects/{id}/tasks/{task_id}`
pub async fn delete_task<C>(
    State(state): State<Arc<AppState<C>>>,
    Caller(user): Caller,
    Path((project_id, task_id)): Path<(ProjectId, TaskId)>,
) -> ApiResult
where
    C: Clock + Send + Sync + 'static,
{
    state.tasks.delete(project_id, task_id, user).await?;
    Ok(Json(json!({ "message": "Task deleted successfully" })))
}

/// `GET /projects/{id}/analytics`
pub async fn project_analytics<C>(
    State(state): State<Arc<AppState<C>>>,
    Caller(user): Caller,
    Path(project_id): Path<ProjectId>,
) -> Result<Json<ProjectAnalytics>, ApiError>
where
    C: Clock + Send + Sync + 'static,
{
    let analytics = state.tasks.analytics(project_id, user).await?;
    Ok(Json(analytics))
}

/// `GET /users/me`
pub async fn my_profile<C>(
    State(state): State<Arc<AppState<C>>>,
    Caller(user): Caller,
) -> Result<Json<UserProfile>, ApiError>
where
    C: Clock + Send + Sync + 'static,
{
    let profile = state.users.profile(user).await?;
    Ok(Json(profile))
}

/// `GET /users/search?username=...`
pub async fn search_users<C>(
    State(state): State<Arc<AppState<C>>>,
    Caller(user): Caller,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<UserProfile>>, ApiError>
where
    C: Clock + Send + Sync + 'static,
{
    let users = state.users.search(user, &query.username).await?;
    Ok(Json(users))
}
