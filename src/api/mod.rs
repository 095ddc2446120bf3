//! HTTP surface.
//!
//! Every route expects the authenticated caller in the `x-user-id` header,
//! set by upstream authentication middleware. Service errors map to one
//! status per [`crate::error::ErrorKind`] with a JSON body of the form
//! `{"message": ..., "kind": ...}`.

mod caller;
mod error;
mod handlers;
mod routes;
mod state;
mod types;

pub use caller::{CALLER_HEADER, Caller};
pub use error::ApiError;
pub use routes::router;
pub use state::{AppInvitations, AppMembership, AppPorts, AppProjects, AppState, AppTasks};
pub use types::{
    AddMemberBody, CreateInvitationBody, CreateProjectBody, CreateTaskBody, SearchQuery,
    UpdateProjectBody, UpdateTaskBody,
};

#[cfg(test)]
mod tests;
