//! Shared world state for invitation lifecycle BDD scenarios.

use std::collections::HashMap;

use atelier::error::ErrorKind;
use atelier::identity::domain::UserId;
use atelier::invitation::domain::InvitationId;
use atelier::project::domain::{Project, ProjectId};
use rstest::fixture;

use crate::test_helpers::TestApp;

/// Scenario world for invitation lifecycle behaviour tests.
pub struct InvitationWorld {
    /// Application under test.
    pub app: TestApp,
    /// Registered users by username.
    pub users: HashMap<String, UserId>,
    /// Project the scenario operates on.
    pub project_id: Option<ProjectId>,
    /// Invitation the scenario operates on.
    pub invitation_id: Option<InvitationId>,
    /// Error kind of the last failed request.
    pub last_error: Option<ErrorKind>,
}

impl InvitationWorld {
    /// Creates a world over a fresh application.
    #[must_use]
    pub fn new() -> Self {
        Self {
            app: TestApp::new(),
            users: HashMap::new(),
            project_id: None,
            invitation_id: None,
            last_error: None,
        }
    }

    /// Registers `username` unless already known.
    pub fn ensure_user(&mut self, username: &str) -> UserId {
        if let Some(id) = self.users.get(username) {
            return *id;
        }
        let id = self.app.register(username);
        self.users.insert(username.to_owned(), id);
        id
    }

    /// Looks up a registered user.
    pub fn user(&self, username: &str) -> Result<UserId, eyre::Report> {
        self.users
            .get(username)
            .copied()
            .ok_or_else(|| eyre::eyre!("user '{username}' is not registered in the scenario"))
    }

    /// Returns the scenario project identifier.
    pub fn project_id(&self) -> Result<ProjectId, eyre::Report> {
        self.project_id
            .ok_or_else(|| eyre::eyre!("no project in scenario world"))
    }

    /// Returns the scenario invitation identifier.
    pub fn invitation_id(&self) -> Result<InvitationId, eyre::Report> {
        self.invitation_id
            .ok_or_else(|| eyre::eyre!("no invitation in scenario world"))
    }

    /// Loads the scenario project bypassing access checks.
    pub fn stored_project(&self) -> Result<Project, eyre::Report> {
        let project_id = self.project_id()?;
        run_async(self.app.state.projects.find(project_id))
            .map_err(|err| eyre::eyre!("project lookup failed: {err}"))?
            .ok_or_else(|| eyre::eyre!("project {project_id} is missing"))
    }
}

impl Default for InvitationWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> InvitationWorld {
    InvitationWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
