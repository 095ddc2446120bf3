//! Route table.

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post, put},
};
use mockable::Clock;

use super::handlers::{
    accept_invitation, add_member, cancel_invitation, create_invitation, create_project,
    create_task, delete_task, get_project, health_check, list_my_invitations,
    list_project_invitations, list_projects, list_tasks, my_profile, project_analytics,
    reject_invitation, search_users, update_project, update_task,
};
use super::state::AppState;

/// Builds the application router over `state`.
pub fn router<C>(state: Arc<AppState<C>>) -> Router
where
    C: Clock + Send + Sync + 'static,
{
    Router::new()
        .route("/health", get(health_check))
        .route("/projects", get(list_projects::<C>).post(create_project::<C>))
        .route(
            "/projects/{id}",
            get(get_project::<C>).put(update_project::<C>),
        )
        .route("/projects/{id}/members", post(add_member::<C>))
        .route("/projects/{id}/analytics", get(project_analytics::<C>))
        .route(
            "/projects/{id}/invitations",
            get(list_project_invitations::<C>).post(create_invitation::<C>),
        )
        .route(
            "/projects/{id}/tasks",
            get(list_tasks::<C>).post(create_task::<C>),
        )
        .route(
            "/projects/{id}/tasks/{task_id}",
            put(update_task::<C>).delete(delete_task::<C>),
        )
        .route("/invitations", get(list_my_invitations::<C>))
        .route("/invitations/{id}", axum::routing::delete(cancel_invitation::<C>))
        .route("/invitations/{id}/accept", put(accept_invitation::<C>))
        .route("/invitations/{id}/reject", put(reject_invitation::<C>))
        .route("/users/me", get(my_profile::<C>))
        .route("/users/search", get(search_users::<C>))
        .with_state(state)
}
