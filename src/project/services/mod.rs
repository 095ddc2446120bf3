//! Application services for project registry orchestration.

mod registry;

pub use registry::{
    CreateProjectRequest, MAX_UPDATE_ATTEMPTS, ProjectRegistryService, ProjectServiceError,
    ProjectServiceResult, UpdateProjectRequest, ensure_member,
};
